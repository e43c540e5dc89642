use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info};

use super::{
    model::{KrakenEvent, KrakenMessage, KrakenSubscriptionStatus},
    KrakenSpotPublicData,
};
use crate::{
    error::SocketError,
    model::market_event::{EventQuote, MarketEvent},
    shared::{
        registry::SymbolRegistry,
        subscription_models::{CanonicalSymbol, ExchangeId},
    },
    transformer::{ExchangeTransformer, Transformer},
};

/*----- */
// Kraken transformer
/*----- */
/// Kraken data frames only carry the channel id assigned in the subscription
/// ack, so the transformer keeps a channel id -> canonical symbol map for the
/// lifetime of one connection.
#[derive(Debug)]
pub struct KrakenTransformer {
    registry: Arc<SymbolRegistry>,
    channels: HashMap<u64, CanonicalSymbol>,
}

impl KrakenTransformer {
    pub fn channel_symbol(&self, channel_id: u64) -> Option<&CanonicalSymbol> {
        self.channels.get(&channel_id)
    }

    fn process_subscription_status(
        &mut self,
        status: KrakenSubscriptionStatus,
    ) -> Result<Option<MarketEvent<EventQuote>>, SocketError> {
        match status.status.as_str() {
            "subscribed" => {
                let (channel_id, pair) = match (status.channel_id, status.pair) {
                    (Some(channel_id), Some(pair)) => (channel_id, pair),
                    (channel_id, pair) => {
                        return Err(SocketError::Subscribe {
                            exchange: ExchangeId::Kraken,
                            reason: format!(
                                "subscribed ack without channel id or pair: {:?} {:?}",
                                channel_id, pair
                            ),
                        })
                    }
                };

                let symbol = self
                    .registry
                    .resolve(ExchangeId::Kraken, &pair)
                    .ok_or_else(|| SocketError::UnknownInstrument {
                        exchange: ExchangeId::Kraken,
                        native_id: pair.clone(),
                    })?
                    .clone();

                info!(
                    exchange = %ExchangeId::Kraken,
                    channel_id,
                    pair = %pair,
                    symbol = %symbol,
                    "subscription acknowledged"
                );

                self.channels.insert(channel_id, symbol);
                Ok(None)
            }
            "unsubscribed" => {
                if let Some(channel_id) = status.channel_id {
                    self.channels.remove(&channel_id);
                }
                debug!(
                    exchange = %ExchangeId::Kraken,
                    channel_id = ?status.channel_id,
                    pair = ?status.pair,
                    "unsubscription acknowledged"
                );
                Ok(None)
            }
            _ => Err(SocketError::Subscribe {
                exchange: ExchangeId::Kraken,
                reason: format!(
                    "pair {:?} status {}: {}",
                    status.pair,
                    status.status,
                    status.error_message.unwrap_or_default()
                ),
            }),
        }
    }
}

impl Transformer for KrakenTransformer {
    type Error = SocketError;
    type Input = KrakenMessage;
    type Output = MarketEvent<EventQuote>;

    fn transform(&mut self, update: Self::Input) -> Result<Option<Self::Output>, Self::Error> {
        match update {
            KrakenMessage::Ticker(ticker) => {
                let symbol = self.channels.get(&ticker.channel_id()).ok_or(
                    SocketError::UnknownChannel {
                        exchange: ExchangeId::Kraken,
                        channel_id: ticker.channel_id(),
                    },
                )?;

                Ok(Some(MarketEvent::new_quote(
                    ExchangeId::Kraken,
                    symbol.clone(),
                    None,
                    EventQuote::new(Some(ticker.data().best_bid), Some(ticker.data().best_ask)),
                )))
            }
            KrakenMessage::Event(KrakenEvent::SubscriptionStatus(status)) => {
                self.process_subscription_status(status)
            }
            KrakenMessage::Event(KrakenEvent::SystemStatus { status }) => {
                debug!(exchange = %ExchangeId::Kraken, ?status, "received system status");
                Ok(None)
            }
            KrakenMessage::Event(_) => Ok(None),
        }
    }
}

impl ExchangeTransformer<KrakenSpotPublicData> for KrakenTransformer {
    fn init(registry: Arc<SymbolRegistry>) -> Self {
        Self {
            registry,
            channels: HashMap::new(),
        }
    }
}

/*----- */
// Test
/*----- */
#[cfg(test)]
mod test {
    use super::*;

    fn transformer() -> KrakenTransformer {
        let registry = SymbolRegistry::builder()
            .add(ExchangeId::Kraken, "XBT/USD", CanonicalSymbol::from("BTC/USD"))
            .unwrap()
            .add(ExchangeId::Kraken, "ETH/USD", CanonicalSymbol::from("ETH/USD"))
            .unwrap()
            .build();
        KrakenTransformer::init(Arc::new(registry))
    }

    fn parse(input: &str) -> KrakenMessage {
        serde_json::from_str::<KrakenMessage>(input).unwrap()
    }

    fn ack(channel_id: u64, pair: &str) -> KrakenMessage {
        parse(&format!(
            r#"{{"channelID":{channel_id},"channelName":"ticker","event":"subscriptionStatus","pair":"{pair}","status":"subscribed","subscription":{{"name":"ticker"}}}}"#
        ))
    }

    fn ticker(channel_id: u64, bid: &str, ask: &str) -> KrakenMessage {
        parse(&format!(
            r#"[{channel_id},{{"a":["{ask}",1,"1.000"],"b":["{bid}",2,"2.000"],"c":["{bid}","0.1"]}},"ticker","XBT/USD"]"#
        ))
    }

    #[test]
    fn test_ticker_after_ack() {
        let mut transformer = transformer();

        assert!(transformer.transform(ack(42, "XBT/USD")).unwrap().is_none());
        assert_eq!(
            transformer.channel_symbol(42),
            Some(&CanonicalSymbol::from("BTC/USD"))
        );

        let event = transformer
            .transform(ticker(42, "50000.1", "50000.2"))
            .unwrap()
            .unwrap();
        assert_eq!(event.exchange, ExchangeId::Kraken);
        assert_eq!(event.symbol, CanonicalSymbol::from("BTC/USD"));
        assert_eq!(event.event_data, EventQuote::new(Some(50000.1), Some(50000.2)));
    }

    #[test]
    fn test_ticker_on_unbound_channel_is_discarded() {
        let mut transformer = transformer();

        let error = transformer
            .transform(ticker(42, "50000.1", "50000.2"))
            .unwrap_err();
        assert!(matches!(
            error,
            SocketError::UnknownChannel { channel_id: 42, .. }
        ));
        assert!(!error.is_terminal());

        // Subsequent valid messages are unaffected
        transformer.transform(ack(43, "XBT/USD")).unwrap();
        assert!(transformer
            .transform(ticker(43, "1.0", "2.0"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_ack_for_unknown_pair_is_not_bound() {
        let mut transformer = transformer();

        let error = transformer.transform(ack(7, "DOGE/USD")).unwrap_err();
        assert!(matches!(error, SocketError::UnknownInstrument { .. }));
        assert_eq!(transformer.channel_symbol(7), None);
    }

    #[test]
    fn test_subscription_error() {
        let mut transformer = transformer();
        let message = parse(
            r#"{"errorMessage":"Currency pair not supported","event":"subscriptionStatus","pair":"XBT/EUX","status":"error","subscription":{"name":"ticker"}}"#,
        );

        let error = transformer.transform(message).unwrap_err();
        assert!(matches!(error, SocketError::Subscribe { .. }));
        assert!(!error.is_terminal());
    }

    #[test]
    fn test_unsubscribe_unbinds_channel() {
        let mut transformer = transformer();
        transformer.transform(ack(42, "XBT/USD")).unwrap();

        let message = parse(
            r#"{"channelID":42,"event":"subscriptionStatus","pair":"XBT/USD","status":"unsubscribed","subscription":{"name":"ticker"}}"#,
        );
        assert!(transformer.transform(message).unwrap().is_none());
        assert_eq!(transformer.channel_symbol(42), None);
    }

    #[test]
    fn test_control_messages_yield_nothing() {
        let mut transformer = transformer();
        assert!(transformer
            .transform(parse(r#"{"event":"heartbeat"}"#))
            .unwrap()
            .is_none());
        assert!(transformer
            .transform(parse(r#"{"event":"systemStatus","status":"online"}"#))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_new_connection_starts_unbound() {
        let mut first = transformer();
        first.transform(ack(42, "XBT/USD")).unwrap();

        let second = transformer();
        assert_eq!(second.channel_symbol(42), None);
    }
}
