use arbwatch_data::{
    model::quote::Quote,
    shared::subscription_models::{CanonicalSymbol, ExchangeId},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;

/*----- */
// Net spread
/*----- */
/// Fee adjusted profit per unit of buying at `buy_price` and selling at
/// `sell_price`, with taker fees given as fractions.
#[inline]
pub fn net_spread(buy_price: f64, sell_price: f64, fee_buy: f64, fee_sell: f64) -> f64 {
    sell_price * (1.0 - fee_sell) - buy_price * (1.0 + fee_buy)
}

/*----- */
// Direction
/*----- */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    CoinbaseToKraken,
    KrakenToCoinbase,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::CoinbaseToKraken, Direction::KrakenToCoinbase];

    pub fn buy_exchange(&self) -> ExchangeId {
        match self {
            Direction::CoinbaseToKraken => ExchangeId::Coinbase,
            Direction::KrakenToCoinbase => ExchangeId::Kraken,
        }
    }

    pub fn sell_exchange(&self) -> ExchangeId {
        match self {
            Direction::CoinbaseToKraken => ExchangeId::Kraken,
            Direction::KrakenToCoinbase => ExchangeId::Coinbase,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::CoinbaseToKraken => "coinbase->kraken",
            Direction::KrakenToCoinbase => "kraken->coinbase",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/*----- */
// Opportunity
/*----- */
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub pair: CanonicalSymbol,
    pub direction: Direction,
    pub buy_price: f64,
    pub sell_price: f64,
    pub net_spread: f64,
    pub time: DateTime<Utc>,
}

/*----- */
// Consolidated quote
/*----- */
/// Both exchanges' quotes for one symbol as read in a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedQuote {
    pub symbol: CanonicalSymbol,
    pub coinbase: Quote,
    pub kraken: Quote,
    pub variation_pct: f64,
    pub time: DateTime<Utc>,
}

impl ConsolidatedQuote {
    pub fn new(
        symbol: CanonicalSymbol,
        coinbase: Quote,
        kraken: Quote,
        time: DateTime<Utc>,
    ) -> Self {
        let variation_pct = match (coinbase.midprice(), kraken.midprice()) {
            (Some(coinbase_mid), Some(kraken_mid)) if kraken_mid > 0.0 => {
                ((kraken_mid - coinbase_mid) / kraken_mid * 100.0).abs()
            }
            _ => 0.0,
        };

        Self {
            symbol,
            coinbase,
            kraken,
            variation_pct,
            time,
        }
    }

    pub fn quote(&self, exchange: ExchangeId) -> &Quote {
        match exchange {
            ExchangeId::Coinbase => &self.coinbase,
            ExchangeId::Kraken => &self.kraken,
        }
    }
}

/*----- */
// Scanner event
/*----- */
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerEvent {
    Opportunity(Opportunity),
    Snapshot(ConsolidatedQuote),
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_net_spread_fees_dominate() {
        assert_close(net_spread(50_000.0, 50_010.0, 0.005, 0.005), -490.05);
    }

    #[test]
    fn test_net_spread_positive() {
        assert_close(net_spread(50_000.0, 50_400.0, 0.001, 0.001), 299.6);
    }

    #[test]
    fn test_net_spread_is_monotone() {
        let prices = [0.5, 1.0, 99.0, 1_000.0, 50_000.0];
        let fees = [0.0, 0.001, 0.005, 0.26];

        for &fee_buy in fees.iter() {
            for &fee_sell in fees.iter() {
                for &price in prices.iter() {
                    let base = net_spread(price, price, fee_buy, fee_sell);
                    assert!(net_spread(price, price * 1.01, fee_buy, fee_sell) > base);
                    assert!(net_spread(price * 1.01, price, fee_buy, fee_sell) < base);
                }
            }
        }
    }

    #[test]
    fn test_direction_legs() {
        assert_eq!(Direction::CoinbaseToKraken.buy_exchange(), ExchangeId::Coinbase);
        assert_eq!(Direction::CoinbaseToKraken.sell_exchange(), ExchangeId::Kraken);
        assert_eq!(Direction::KrakenToCoinbase.buy_exchange(), ExchangeId::Kraken);
        assert_eq!(Direction::KrakenToCoinbase.sell_exchange(), ExchangeId::Coinbase);
    }

    #[test]
    fn test_variation_uses_mid_prices() {
        let time = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let coinbase = Quote::new(Some(99.0), Some(101.0), time);
        let kraken = Quote::new(Some(199.0), Some(201.0), time);

        let snapshot = ConsolidatedQuote::new(CanonicalSymbol::from("BTC/USD"), coinbase, kraken, time);
        assert_close(snapshot.variation_pct, 50.0);
        assert_eq!(snapshot.quote(ExchangeId::Kraken), &kraken);
    }
}
