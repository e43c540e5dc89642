#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KrakenChannel(pub &'static str);

impl KrakenChannel {
    pub const TICKER: Self = Self("ticker");
}

impl AsRef<str> for KrakenChannel {
    fn as_ref(&self) -> &str {
        self.0
    }
}
