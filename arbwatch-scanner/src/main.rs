use arbwatch_data::{store::QuoteStore, streams::QuoteChannels};
use arbwatch_scanner::{
    config::Config, data::data_streams::spawn_quote_streams, display::sink::OpportunitySink,
    spread_scanner::evaluator::SpreadEvaluator,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/*----- */
// Main
/*----- */
#[tokio::main]
async fn main() {
    // Init
    init_logging();

    // Config
    let path = Config::path_from_env();
    let mut config = Config::load_or_init(&path);
    let registry = Arc::new(config.validate());
    info!(
        path = %path.display(),
        pairs = ?config.pairs.iter().map(|pair| pair.symbol.as_str()).collect::<Vec<_>>(),
        "arbwatch starting"
    );

    // Channels
    let store = Arc::new(QuoteStore::new());
    let (quote_tx, quote_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();

    // Spawn connectors
    let mut tasks = spawn_quote_streams(
        Arc::clone(&registry),
        &config.connector,
        QuoteChannels::new(Arc::clone(&store), quote_tx, status_tx),
        shutdown.clone(),
    );

    // Spawn evaluator
    let evaluator = SpreadEvaluator::new(
        &config.pairs,
        Arc::clone(&store),
        &config.evaluator,
        quote_rx,
        event_tx,
    );
    tasks.push(tokio::spawn(evaluator.run(shutdown.clone())));

    // Spawn sink
    let sink = OpportunitySink::new(config.display.clone(), event_rx, status_rx);
    tasks.push(tokio::spawn(sink.run(shutdown.clone())));

    // Wait for interrupt
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to listen for interrupt signal, shutting down");
    }
    info!("interrupt received, shutting down");
    shutdown.cancel();

    for result in join_all(tasks).await {
        if let Err(error) = result {
            error!(%error, "task failed during shutdown");
        }
    }

    info!("arbwatch stopped");
}

/*----- */
// Logging config
/*----- */
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        // Keep stdout for the quote table
        .with_writer(std::io::stderr)
        // Disable colours on release builds
        .with_ansi(cfg!(debug_assertions))
        // Enable Json formatting
        .json()
        // Install this Tracing subscriber as global default
        .init()
}
