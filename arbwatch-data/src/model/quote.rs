use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/*----- */
// Quote
/*----- */
/// Latest known best bid and best ask for one instrument on one exchange.
/// `updated_at` is the time of the last write, while staleness is judged per
/// side so a one sided update cannot make the other side look fresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    bid_at: DateTime<Utc>,
    #[serde(skip)]
    ask_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(bid: Option<f64>, ask: Option<f64>, updated_at: DateTime<Utc>) -> Self {
        Self {
            bid,
            ask,
            updated_at,
            bid_at: updated_at,
            ask_at: updated_at,
        }
    }

    /// Both sides have been set at least once.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.bid.is_some() && self.ask.is_some()
    }

    /// Age of the older of the two sides.
    #[inline]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.bid_at.min(self.ask_at)
    }

    /// Returns (bid, ask) if the quote is complete and, when `max_age` is given,
    /// neither side is older than `max_age` at `now`.
    pub fn usable_bba(&self, now: DateTime<Utc>, max_age: Option<Duration>) -> Option<(f64, f64)> {
        if let Some(max_age) = max_age {
            if self.age(now) > max_age {
                return None;
            }
        }

        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid, ask)),
            _ => None,
        }
    }

    #[inline]
    pub fn midprice(&self) -> Option<f64> {
        if let (Some(bid), Some(ask)) = (self.bid, self.ask) {
            return Some((bid + ask) / 2.0);
        }

        None
    }

    /// Overwrite only the sides that are present and stamp `at`. The last write
    /// wins, so a full write is always read back as exactly that triple.
    pub(crate) fn apply(&mut self, bid: Option<f64>, ask: Option<f64>, at: DateTime<Utc>) {
        if bid.is_some() {
            self.bid = bid;
            self.bid_at = at;
        }

        if ask.is_some() {
            self.ask = ask;
            self.ask_at = at;
        }

        self.updated_at = at;
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn time(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_apply_partial_updates() {
        let mut quote = Quote::new(None, None, time(0));
        assert!(!quote.is_complete());

        quote.apply(Some(100.0), None, time(1));
        assert_eq!(quote.bid, Some(100.0));
        assert_eq!(quote.ask, None);
        assert!(!quote.is_complete());

        quote.apply(None, Some(101.0), time(2));
        assert!(quote.is_complete());

        // Single sided update keeps the other side
        quote.apply(Some(99.5), None, time(3));
        assert_eq!(
            (quote.bid, quote.ask, quote.updated_at),
            (Some(99.5), Some(101.0), time(3))
        );
        assert!(quote.is_complete());
    }

    #[test]
    fn test_apply_last_write_wins() {
        let mut quote = Quote::new(Some(1.0), Some(2.0), time(10));
        quote.apply(Some(1.5), Some(2.5), time(5));
        assert_eq!(quote, Quote::new(Some(1.5), Some(2.5), time(5)));
    }

    #[test]
    fn test_one_sided_update_does_not_refresh_other_side() {
        let max_age = Some(Duration::seconds(10));
        let mut quote = Quote::new(Some(1.0), Some(2.0), time(0));

        quote.apply(Some(1.5), None, time(30));
        assert_eq!(quote.updated_at, time(30));
        assert_eq!(quote.age(time(30)), Duration::seconds(30));
        assert_eq!(quote.usable_bba(time(30), max_age), None);

        quote.apply(None, Some(2.5), time(31));
        assert_eq!(quote.usable_bba(time(31), max_age), Some((1.5, 2.5)));
    }

    #[test]
    fn test_usable_bba() {
        let quote = Quote::new(Some(1.0), Some(2.0), time(0));
        assert_eq!(quote.usable_bba(time(100), None), Some((1.0, 2.0)));
        assert_eq!(
            quote.usable_bba(time(100), Some(Duration::seconds(100))),
            Some((1.0, 2.0))
        );
        assert_eq!(quote.usable_bba(time(101), Some(Duration::seconds(100))), None);

        let incomplete = Quote::new(Some(1.0), None, time(0));
        assert_eq!(incomplete.usable_bba(time(0), None), None);
    }

    #[test]
    fn test_midprice() {
        assert_eq!(Quote::new(Some(1.0), Some(3.0), time(0)).midprice(), Some(2.0));
        assert_eq!(Quote::new(None, Some(3.0), time(0)).midprice(), None);
    }
}
