pub mod channel;
pub mod model;
pub mod transformer;

use channel::KrakenChannel;
use serde_json::json;
use std::time::Duration;
use transformer::KrakenTransformer;

use super::StreamConnector;
use crate::{
    protocols::ws::{PingInterval, WsMessage},
    shared::subscription_models::{ExchangeId, ExchangeSubscription},
};

#[derive(Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Clone)]
pub struct KrakenSpotPublicData;

const KRAKEN_SPOT_WS_URL: &str = "wss://ws.kraken.com";

pub const KRAKEN_PING_INTERVAL: Duration = Duration::from_secs(30);

impl StreamConnector for KrakenSpotPublicData {
    type Channel = KrakenChannel;
    type StreamTransformer = KrakenTransformer;

    const ID: ExchangeId = ExchangeId::Kraken;

    fn url() -> &'static str {
        KRAKEN_SPOT_WS_URL
    }

    fn channel() -> Self::Channel {
        KrakenChannel::TICKER
    }

    fn ping_interval() -> Option<PingInterval> {
        Some(PingInterval {
            time: KRAKEN_PING_INTERVAL,
            message: json!({"event": "ping"}),
        })
    }

    // One request per pair so each ack carries the channel id of exactly one pair
    fn requests(subscriptions: &[ExchangeSubscription<Self::Channel>]) -> Vec<WsMessage> {
        subscriptions
            .iter()
            .map(|s| {
                let request = json!({
                    "event": "subscribe",
                    "pair": [s.market],
                    "subscription": {"name": s.channel.as_ref()},
                });
                WsMessage::Text(request.to_string())
            })
            .collect()
    }
}
