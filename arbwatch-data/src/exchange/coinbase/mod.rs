pub mod channel;
pub mod model;

use channel::CoinbaseChannel;
use itertools::Itertools;
use model::CoinbaseMessage;
use serde_json::json;

use super::StreamConnector;
use crate::{
    protocols::ws::WsMessage,
    shared::subscription_models::{ExchangeId, ExchangeSubscription},
    transformer::stateless_transformer::StatelessTransformer,
};

#[derive(Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Clone)]
pub struct CoinbaseSpotPublicData;

const COINBASE_SPOT_WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";

impl StreamConnector for CoinbaseSpotPublicData {
    type Channel = CoinbaseChannel;
    type StreamTransformer = StatelessTransformer<Self, CoinbaseMessage>;

    const ID: ExchangeId = ExchangeId::Coinbase;

    fn url() -> &'static str {
        COINBASE_SPOT_WS_URL
    }

    fn channel() -> Self::Channel {
        CoinbaseChannel::TICKER
    }

    // Coinbase takes every product and channel in a single request
    fn requests(subscriptions: &[ExchangeSubscription<Self::Channel>]) -> Vec<WsMessage> {
        if subscriptions.is_empty() {
            return Vec::new();
        }

        let product_ids = subscriptions
            .iter()
            .map(|s| s.market.as_str())
            .collect::<Vec<_>>();

        let channels = subscriptions
            .iter()
            .map(|s| s.channel.as_ref())
            .chain(std::iter::once(CoinbaseChannel::HEARTBEAT.as_ref()))
            .unique()
            .collect::<Vec<_>>();

        let request = json!({
            "type": "subscribe",
            "product_ids": product_ids,
            "channels": channels,
        });

        vec![WsMessage::Text(request.to_string())]
    }
}
