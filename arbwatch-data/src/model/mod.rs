pub mod market_event;
pub mod quote;
