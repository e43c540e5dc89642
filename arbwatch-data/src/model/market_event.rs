use chrono::{DateTime, Utc};
use std::fmt::Display;

use crate::shared::subscription_models::{CanonicalSymbol, ExchangeId};

/*----- */
// Market Event - Generic
/*----- */
#[derive(Debug, Clone, PartialEq)]
pub struct MarketEvent<Event> {
    pub exchange_time: Option<DateTime<Utc>>,
    pub received_time: DateTime<Utc>,
    pub exchange: ExchangeId,
    pub symbol: CanonicalSymbol,
    pub event_data: Event,
}

/*----- */
// Event quote - best bid and/or best ask from one exchange message
/*----- */
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventQuote {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

impl EventQuote {
    pub fn new(bid: Option<f64>, ask: Option<f64>) -> Self {
        Self { bid, ask }
    }

    pub fn is_empty(&self) -> bool {
        self.bid.is_none() && self.ask.is_none()
    }
}

impl MarketEvent<EventQuote> {
    pub fn new_quote(
        exchange: ExchangeId,
        symbol: CanonicalSymbol,
        exchange_time: Option<DateTime<Utc>>,
        quote: EventQuote,
    ) -> Self {
        Self {
            exchange_time,
            received_time: Utc::now(),
            exchange,
            symbol,
            event_data: quote,
        }
    }
}

/*----- */
// Quote updated notification - sent after every quote store write
/*----- */
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteUpdated {
    pub exchange: ExchangeId,
    pub symbol: CanonicalSymbol,
}

/*----- */
// Connection state
/*----- */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribing,
    Streaming,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Subscribing => "subscribing",
            ConnectionState::Streaming => "streaming",
        }
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/*----- */
// Connection status
/*----- */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionStatus {
    pub exchange: ExchangeId,
    pub state: ConnectionState,
    pub time: DateTime<Utc>,
}

impl ConnectionStatus {
    pub fn new(exchange: ExchangeId, state: ConnectionState) -> Self {
        Self {
            exchange,
            state,
            time: Utc::now(),
        }
    }
}
