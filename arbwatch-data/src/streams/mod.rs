pub mod consumer;

use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    model::market_event::{ConnectionStatus, QuoteUpdated},
    store::QuoteStore,
};

/*----- */
// Quote channels
/*----- */
/// Everything a connector writes to: the shared store, the per-update
/// notification feeding the evaluator, and the connection status feed.
#[derive(Debug, Clone)]
pub struct QuoteChannels {
    pub store: Arc<QuoteStore>,
    pub quote_tx: UnboundedSender<QuoteUpdated>,
    pub status_tx: UnboundedSender<ConnectionStatus>,
}

impl QuoteChannels {
    pub fn new(
        store: Arc<QuoteStore>,
        quote_tx: UnboundedSender<QuoteUpdated>,
        status_tx: UnboundedSender<ConnectionStatus>,
    ) -> Self {
        Self {
            store,
            quote_tx,
            status_tx,
        }
    }
}
