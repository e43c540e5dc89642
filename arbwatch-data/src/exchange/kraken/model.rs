use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

use crate::shared::de::de_first_str_as_f64;

/*----- */
// Kraken message
/*----- */
#[derive(Debug)]
pub enum KrakenMessage {
    Ticker(KrakenTicker),
    Event(KrakenEvent),
}

// Data frames are arrays and control messages are objects. Dispatching on the
// shape keeps a malformed data frame an error instead of an ignored event.
impl<'de> Deserialize<'de> for KrakenMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            value @ Value::Array(_) => KrakenTicker::deserialize(value)
                .map(KrakenMessage::Ticker)
                .map_err(de::Error::custom),
            value @ Value::Object(_) => KrakenEvent::deserialize(value)
                .map(KrakenMessage::Event)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "expected a kraken array or object, found {other}"
            ))),
        }
    }
}

/*----- */
// Kraken control messages
/*----- */
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum KrakenEvent {
    SubscriptionStatus(KrakenSubscriptionStatus),
    Heartbeat,
    SystemStatus {
        #[serde(default)]
        status: Option<String>,
    },
    Pong,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct KrakenSubscriptionStatus {
    #[serde(rename = "channelID", default)]
    pub channel_id: Option<u64>,
    #[serde(default)]
    pub pair: Option<String>,
    pub status: String,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

/*----- */
// Kraken ticker
/*----- */
// [channelID, {"a": [..], "b": [..], ..}, "ticker", "XBT/USD"]
#[derive(Debug, Deserialize, PartialEq)]
pub struct KrakenTicker(
    pub u64,
    pub KrakenTickerData,
    pub String,
    pub String,
);

impl KrakenTicker {
    pub fn channel_id(&self) -> u64 {
        self.0
    }

    pub fn data(&self) -> &KrakenTickerData {
        &self.1
    }

    pub fn pair(&self) -> &str {
        &self.3
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct KrakenTickerData {
    #[serde(rename = "a", deserialize_with = "de_first_str_as_f64")]
    pub best_ask: f64,
    #[serde(rename = "b", deserialize_with = "de_first_str_as_f64")]
    pub best_bid: f64,
}

/*----- */
// Test
/*----- */
