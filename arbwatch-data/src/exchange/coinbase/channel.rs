#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinbaseChannel(pub &'static str);

impl CoinbaseChannel {
    pub const TICKER: Self = Self("ticker");

    /// One message per product per second, keeps quiet feeds visibly alive.
    pub const HEARTBEAT: Self = Self("heartbeat");
}

impl AsRef<str> for CoinbaseChannel {
    fn as_ref(&self) -> &str {
        self.0
    }
}
