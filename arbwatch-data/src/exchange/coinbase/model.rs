use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::SocketError,
    model::market_event::EventQuote,
    shared::{de::de_str_optional, subscription_models::ExchangeId},
    transformer::{MarketUpdate, NativeQuote},
};

/*----- */
// Coinbase message
/*----- */
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoinbaseMessage {
    Ticker(CoinbaseTicker),
    Subscriptions {
        #[serde(default)]
        channels: serde_json::Value,
    },
    Heartbeat,
    Error {
        message: String,
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Other,
}

/*----- */
// Coinbase ticker
/*----- */
#[derive(Debug, Deserialize, PartialEq)]
pub struct CoinbaseTicker {
    pub product_id: String,
    #[serde(default, deserialize_with = "de_str_optional")]
    pub best_bid: Option<f64>,
    #[serde(default, deserialize_with = "de_str_optional")]
    pub best_ask: Option<f64>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

impl MarketUpdate for CoinbaseMessage {
    fn market_update(self) -> Result<Option<NativeQuote>, SocketError> {
        match self {
            CoinbaseMessage::Ticker(ticker) => Ok(Some(NativeQuote {
                market: ticker.product_id,
                exchange_time: ticker.time,
                quote: EventQuote::new(ticker.best_bid, ticker.best_ask),
            })),
            CoinbaseMessage::Subscriptions { channels } => {
                debug!(
                    exchange = %ExchangeId::Coinbase,
                    %channels,
                    "received subscription acknowledgement"
                );
                Ok(None)
            }
            CoinbaseMessage::Error { message, reason } => Err(SocketError::ExchangeMessage {
                exchange: ExchangeId::Coinbase,
                message: match reason {
                    Some(reason) => format!("{message}: {reason}"),
                    None => message,
                },
            }),
            CoinbaseMessage::Heartbeat | CoinbaseMessage::Other => Ok(None),
        }
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use std::sync::Arc;

    use super::*;
    use crate::{
        exchange::coinbase::CoinbaseSpotPublicData,
        shared::{registry::SymbolRegistry, subscription_models::CanonicalSymbol},
        transformer::{stateless_transformer::StatelessTransformer, ExchangeTransformer, Transformer},
    };

    const TICKER: &str = r#"{
        "type": "ticker",
        "sequence": 37475248783,
        "product_id": "BTC-USD",
        "price": "50005.00",
        "open_24h": "49000.00",
        "volume_24h": "1234.5",
        "best_bid": "50000.01",
        "best_bid_size": "0.1",
        "best_ask": "50010.99",
        "best_ask_size": "0.2",
        "side": "buy",
        "time": "2024-01-01T00:00:00.000000Z",
        "trade_id": 123,
        "last_size": "0.01"
    }"#;

    fn transformer() -> StatelessTransformer<CoinbaseSpotPublicData, CoinbaseMessage> {
        let registry = SymbolRegistry::builder()
            .add(ExchangeId::Coinbase, "BTC-USD", CanonicalSymbol::from("BTC/USD"))
            .unwrap()
            .build();
        StatelessTransformer::init(Arc::new(registry))
    }

    #[test]
    fn test_de_ticker() {
        let message = serde_json::from_str::<CoinbaseMessage>(TICKER).unwrap();
        match message {
            CoinbaseMessage::Ticker(ticker) => {
                assert_eq!(
                    ticker,
                    CoinbaseTicker {
                        product_id: String::from("BTC-USD"),
                        best_bid: Some(50000.01),
                        best_ask: Some(50010.99),
                        time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
                    }
                )
            }
            other => panic!("expected ticker, got {:?}", other),
        }
    }

    #[test]
    fn test_de_non_price_messages() {
        let ack = r#"{"type":"subscriptions","channels":[{"name":"ticker","product_ids":["BTC-USD"]}]}"#;
        assert!(matches!(
            serde_json::from_str::<CoinbaseMessage>(ack).unwrap(),
            CoinbaseMessage::Subscriptions { .. }
        ));

        let heartbeat = r#"{"type":"heartbeat","sequence":90,"last_trade_id":20,"product_id":"BTC-USD","time":"2014-11-07T08:19:28.464459Z"}"#;
        assert!(matches!(
            serde_json::from_str::<CoinbaseMessage>(heartbeat).unwrap(),
            CoinbaseMessage::Heartbeat
        ));

        let unknown = r#"{"type":"match","product_id":"BTC-USD"}"#;
        assert!(matches!(
            serde_json::from_str::<CoinbaseMessage>(unknown).unwrap(),
            CoinbaseMessage::Other
        ));
    }

    #[test]
    fn test_transform_ticker() {
        let message = serde_json::from_str::<CoinbaseMessage>(TICKER).unwrap();
        let event = transformer().transform(message).unwrap().unwrap();

        assert_eq!(event.exchange, ExchangeId::Coinbase);
        assert_eq!(event.symbol, CanonicalSymbol::from("BTC/USD"));
        assert_eq!(event.event_data, EventQuote::new(Some(50000.01), Some(50010.99)));
    }

    #[test]
    fn test_transform_one_sided_ticker() {
        let message = serde_json::from_str::<CoinbaseMessage>(
            r#"{"type":"ticker","product_id":"BTC-USD","best_bid":"50000.01","best_ask":""}"#,
        )
        .unwrap();
        let event = transformer().transform(message).unwrap().unwrap();
        assert_eq!(event.event_data, EventQuote::new(Some(50000.01), None));
    }

    #[test]
    fn test_transform_unknown_product_is_discarded() {
        let message = serde_json::from_str::<CoinbaseMessage>(
            r#"{"type":"ticker","product_id":"DOGE-USD","best_bid":"0.1","best_ask":"0.2"}"#,
        )
        .unwrap();
        let error = transformer().transform(message).unwrap_err();
        assert!(matches!(error, SocketError::UnknownInstrument { .. }));
        assert!(!error.is_terminal());
    }

    #[test]
    fn test_transform_error_message() {
        let message = serde_json::from_str::<CoinbaseMessage>(
            r#"{"type":"error","message":"Failed to subscribe","reason":"BTC-XYZ is not a valid product"}"#,
        )
        .unwrap();
        let error = transformer().transform(message).unwrap_err();
        assert!(matches!(error, SocketError::ExchangeMessage { .. }));
        assert!(!error.is_terminal());
    }

    #[test]
    fn test_transform_ack_yields_nothing() {
        let message = serde_json::from_str::<CoinbaseMessage>(
            r#"{"type":"subscriptions","channels":[]}"#,
        )
        .unwrap();
        assert!(transformer().transform(message).unwrap().is_none());
    }
}
