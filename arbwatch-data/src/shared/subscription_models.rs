use serde::{Deserialize, Serialize};
use std::fmt::Display;

/*----- */
// Canonical symbol
/*----- */
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CanonicalSymbol(pub String);

impl CanonicalSymbol {
    pub fn new<S>(symbol: S) -> Self
    where
        S: Into<String>,
    {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CanonicalSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CanonicalSymbol {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

/*----- */
// Exchange subscription model
/*----- */
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ExchangeSubscription<Channel> {
    pub exchange: ExchangeId,
    pub channel: Channel,
    pub market: String,
    pub symbol: CanonicalSymbol,
}

impl<Channel> ExchangeSubscription<Channel> {
    pub fn new<S>(
        exchange: ExchangeId,
        channel: Channel,
        market: S,
        symbol: CanonicalSymbol,
    ) -> Self
    where
        S: Into<String>,
    {
        Self {
            exchange,
            channel,
            market: market.into(),
            symbol,
        }
    }
}

/*----- */
// Exchange IDs
/*----- */
#[derive(Debug, PartialEq, Hash, Eq, Clone, Copy, Ord, PartialOrd, Deserialize, Serialize)]
pub enum ExchangeId {
    Coinbase,
    Kraken,
}

impl ExchangeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeId::Coinbase => "coinbase",
            ExchangeId::Kraken => "kraken",
        }
    }
}

impl Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
