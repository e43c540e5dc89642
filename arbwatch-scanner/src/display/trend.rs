use std::collections::VecDeque;

const TREND_EPSILON: f64 = 1e-6;

/*----- */
// Trend
/*----- */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    #[default]
    Unknown,
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn marker(&self) -> &'static str {
        match self {
            Trend::Unknown => " ",
            Trend::Up => "↑",
            Trend::Down => "↓",
            Trend::Flat => "-",
        }
    }
}

/*----- */
// Trend ring - current and previous price only
/*----- */
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRing {
    prices: VecDeque<f64>,
}

impl Default for TrendRing {
    fn default() -> Self {
        Self {
            prices: VecDeque::with_capacity(2),
        }
    }
}

impl TrendRing {
    /// Record `price` and compare it against the previous one.
    pub fn push(&mut self, price: f64) -> Trend {
        if self.prices.len() == 2 {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
        self.trend()
    }

    pub fn trend(&self) -> Trend {
        match (self.prices.front(), self.prices.back()) {
            (Some(previous), Some(current)) if self.prices.len() == 2 => {
                let diff = current - previous;
                if diff.abs() < TREND_EPSILON {
                    Trend::Flat
                } else if diff > 0.0 {
                    Trend::Up
                } else {
                    Trend::Down
                }
            }
            _ => Trend::Unknown,
        }
    }
}
