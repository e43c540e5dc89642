use std::time::Duration;
use thiserror::Error;

use super::shared::subscription_models::{CanonicalSymbol, ExchangeId};

/*----- */
// WebSocketError
/*----- */
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Deserialising JSON error: {error} for payload: {payload}")]
    Deserialise {
        error: serde_json::Error,
        payload: String,
    },

    #[error("Deserialising JSON error: {error} for binary payload: {payload:?}")]
    DeserialiseBinary {
        error: serde_json::Error,
        payload: Vec<u8>,
    },

    #[error("{exchange} sent an update for unrecognised instrument {native_id}")]
    UnknownInstrument {
        exchange: ExchangeId,
        native_id: String,
    },

    #[error("{exchange} sent an update on unbound channel {channel_id}")]
    UnknownChannel { exchange: ExchangeId, channel_id: u64 },

    #[error("{exchange} rejected subscription: {reason}")]
    Subscribe { exchange: ExchangeId, reason: String },

    #[error("{exchange} sent an error message: {message}")]
    ExchangeMessage { exchange: ExchangeId, message: String },

    // Terminal errors
    #[error("ExchangeStream terminated with closing frame: {0}")]
    Terminated(String),

    #[error("no message received from exchange within {0:?}")]
    Timeout(Duration),
}

impl SocketError {
    /// Transport level failures end the current connection, everything else
    /// only invalidates the single message it came from.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_terminal(&self) -> bool {
        match self {
            SocketError::WebSocketError(_) => true,
            SocketError::Terminated(_) => true,
            SocketError::Timeout(_) => true,
            _ => false,
        }
    }
}

/*----- */
// Symbol registry errors
/*----- */
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{exchange} native id {native_id} already maps to {existing}, cannot map it to {requested}")]
    DuplicateNativeId {
        exchange: ExchangeId,
        native_id: String,
        existing: CanonicalSymbol,
        requested: CanonicalSymbol,
    },

    #[error("{symbol} already maps to {exchange} native id {existing}, cannot map it to {requested}")]
    DuplicateSymbol {
        exchange: ExchangeId,
        symbol: CanonicalSymbol,
        existing: String,
        requested: String,
    },
}

#[cfg(test)]
mod test {
    use tokio_tungstenite::tungstenite;

    use super::*;

    #[test]
    fn test_is_terminal() {
        let transport = SocketError::WebSocketError(tungstenite::Error::ConnectionClosed);
        assert!(transport.is_terminal());
        assert!(SocketError::Terminated(String::from("None")).is_terminal());
        assert!(SocketError::Timeout(Duration::from_secs(30)).is_terminal());

        let protocol = SocketError::UnknownInstrument {
            exchange: ExchangeId::Coinbase,
            native_id: String::from("DOGE-USD"),
        };
        assert!(!protocol.is_terminal());

        let malformed = SocketError::Deserialise {
            error: serde_json::from_str::<u64>("oops").unwrap_err(),
            payload: String::from("oops"),
        };
        assert!(!malformed.is_terminal());
    }
}
