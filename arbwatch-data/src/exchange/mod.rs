pub mod coinbase;
pub mod kraken;

use std::fmt::Debug;

use crate::{
    protocols::ws::{PingInterval, WsMessage},
    shared::{
        registry::SymbolRegistry,
        subscription_models::{ExchangeId, ExchangeSubscription},
    },
    transformer::ExchangeTransformer,
};

/*----- */
// Exchange connector trait
/*----- */
pub trait StreamConnector
where
    Self: Sized,
{
    type Channel: Send + Sync + Debug + Clone;
    type StreamTransformer: ExchangeTransformer<Self>;

    const ID: ExchangeId;

    fn url() -> &'static str;

    fn channel() -> Self::Channel;

    fn ping_interval() -> Option<PingInterval> {
        None
    }

    /// Subscription messages sent on every (re)connect.
    fn requests(subscriptions: &[ExchangeSubscription<Self::Channel>]) -> Vec<WsMessage>;

    fn subscriptions(registry: &SymbolRegistry) -> Vec<ExchangeSubscription<Self::Channel>> {
        registry
            .markets(Self::ID)
            .into_iter()
            .map(|(market, symbol)| {
                ExchangeSubscription::new(Self::ID, Self::channel(), market, symbol.clone())
            })
            .collect()
    }
}
