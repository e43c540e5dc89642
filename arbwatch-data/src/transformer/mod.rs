pub mod stateless_transformer;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::SocketError,
    exchange::StreamConnector,
    model::market_event::{EventQuote, MarketEvent},
    shared::registry::SymbolRegistry,
};

/*----- */
// WebSocket transformer
/*----- */
pub trait Transformer {
    type Error: Send;
    type Input: for<'de> Deserialize<'de>;
    type Output: Send;

    /// Each exchange message yields at most one output. Acks, heartbeats and other
    /// non price messages yield Ok(None).
    fn transform(&mut self, update: Self::Input) -> Result<Option<Self::Output>, Self::Error>;
}

/*----- */
// Exchange transformer
/*----- */
pub trait ExchangeTransformer<Exchange>
where
    Self: Transformer<Output = MarketEvent<EventQuote>, Error = SocketError> + Sized + Send,
    Exchange: StreamConnector,
{
    /// Called once per connection, so any state built up from the stream
    /// (e.g. subscription ids) is dropped on reconnect.
    fn init(registry: Arc<SymbolRegistry>) -> Self;
}

/*----- */
// Native quote - quote keyed by the exchange's own instrument id
/*----- */
#[derive(Debug, Clone, PartialEq)]
pub struct NativeQuote {
    pub market: String,
    pub exchange_time: Option<DateTime<Utc>>,
    pub quote: EventQuote,
}

pub trait MarketUpdate {
    /// Ok(None) for messages that carry no price, Err for messages the exchange
    /// uses to report a problem.
    fn market_update(self) -> Result<Option<NativeQuote>, SocketError>;
}
