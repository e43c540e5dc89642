use arbwatch_data::{
    exchange::{coinbase::CoinbaseSpotPublicData, kraken::KrakenSpotPublicData},
    shared::registry::SymbolRegistry,
    streams::{
        consumer::{consume, ConnectorSettings},
        QuoteChannels,
    },
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ConnectorConfig;

/// Spawn one connector task per exchange. Each runs until `shutdown` fires.
pub fn spawn_quote_streams(
    registry: Arc<SymbolRegistry>,
    config: &ConnectorConfig,
    outputs: QuoteChannels,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    /*----- */
    // Coinbase
    /*----- */
    let coinbase_settings = ConnectorSettings::new::<CoinbaseSpotPublicData>()
        .with_reconnect_delay(config.reconnect_delay())
        .with_idle_timeout(config.idle_timeout());

    let coinbase = tokio::spawn(consume::<CoinbaseSpotPublicData>(
        Arc::clone(&registry),
        coinbase_settings,
        outputs.clone(),
        shutdown.clone(),
    ));

    /*----- */
    // Kraken
    /*----- */
    let kraken_settings = ConnectorSettings::new::<KrakenSpotPublicData>()
        .with_reconnect_delay(config.reconnect_delay())
        .with_idle_timeout(config.idle_timeout())
        .with_ping_interval(config.kraken_ping_interval());

    let kraken = tokio::spawn(consume::<KrakenSpotPublicData>(
        registry,
        kraken_settings,
        outputs,
        shutdown,
    ));

    vec![coinbase, kraken]
}
