use futures::{SinkExt, StreamExt};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::UnboundedSender,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::QuoteChannels;
use crate::{
    error::SocketError,
    exchange::StreamConnector,
    model::market_event::{
        ConnectionState, ConnectionStatus, EventQuote, MarketEvent, QuoteUpdated,
    },
    protocols::ws::{
        connect, poll_next::ExchangeStream, schedule_pings_to_exchange, send_requests,
        PingInterval, WsMessage, WsWrite,
    },
    shared::{
        registry::SymbolRegistry,
        subscription_models::{ExchangeId, ExchangeSubscription},
    },
    transformer::ExchangeTransformer,
};

pub const DEFAULT_RECONNECTION_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

// Upper bound on flushing a Close frame during shutdown
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/*----- */
// Connector settings
/*----- */
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    pub url: String,
    pub reconnect_delay: Duration,
    pub idle_timeout: Duration,
    pub ping_interval: Option<PingInterval>,
}

impl ConnectorSettings {
    pub fn new<Exchange>() -> Self
    where
        Exchange: StreamConnector,
    {
        Self {
            url: Exchange::url().to_owned(),
            reconnect_delay: DEFAULT_RECONNECTION_BACKOFF,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            ping_interval: Exchange::ping_interval(),
        }
    }

    pub fn with_url<S>(mut self, url: S) -> Self
    where
        S: Into<String>,
    {
        self.url = url.into();
        self
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Duration) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    /// Bounds connecting, subscribing and the gap between two frames from the
    /// exchange.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Only changes the cadence of exchanges that ping at all.
    pub fn with_ping_interval(mut self, time: Duration) -> Self {
        if let Some(ping_interval) = self.ping_interval.as_mut() {
            ping_interval.time = time;
        }
        self
    }
}

/*----- */
// Connection state machine
/*----- */
#[derive(Debug)]
struct ConnectionMachine {
    exchange: ExchangeId,
    state: ConnectionState,
    status_tx: UnboundedSender<ConnectionStatus>,
}

impl ConnectionMachine {
    fn new(exchange: ExchangeId, status_tx: UnboundedSender<ConnectionStatus>) -> Self {
        Self {
            exchange,
            state: ConnectionState::Disconnected,
            status_tx,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state == next {
            return;
        }

        info!(
            exchange = %self.exchange,
            from = %self.state,
            to = %next,
            "connection state changed"
        );
        self.state = next;

        if let Err(error) = self
            .status_tx
            .send(ConnectionStatus::new(self.exchange, next))
        {
            debug!(
                exchange = %self.exchange,
                payload = ?error.0,
                why = "receiver dropped",
                "failed to send ConnectionStatus upstream"
            );
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    Shutdown,
    Closed,
}

/*----- */
// Consume
/*----- */
/// Keep one exchange connection alive until `shutdown` is cancelled. Every
/// connection goes Connecting -> Subscribing -> Streaming and falls back to
/// Disconnected on any transport failure or when the exchange stays silent for
/// `idle_timeout`, after which the connector waits a constant delay and starts
/// over with a fresh subscription.
pub async fn consume<Exchange>(
    registry: Arc<SymbolRegistry>,
    settings: ConnectorSettings,
    outputs: QuoteChannels,
    shutdown: CancellationToken,
) where
    Exchange: StreamConnector + Send,
{
    let exchange_id = Exchange::ID;
    let subscriptions = Exchange::subscriptions(&registry);

    if subscriptions.is_empty() {
        warn!(
            exchange = %exchange_id,
            action = "not connecting",
            "no markets configured for exchange"
        );
        return;
    }

    info!(
        exchange = %exchange_id,
        url = %settings.url,
        markets = ?subscriptions.iter().map(|s| s.market.as_str()).collect::<Vec<_>>(),
        "starting exchange connector"
    );

    let mut machine = ConnectionMachine::new(exchange_id, outputs.status_tx.clone());
    let mut connection_attempt: u64 = 0;

    loop {
        connection_attempt += 1;
        machine.transition(ConnectionState::Connecting);

        let end = stream_connection::<Exchange>(
            &registry,
            &settings,
            &subscriptions,
            &outputs,
            &mut machine,
            &shutdown,
        )
        .await;

        machine.transition(ConnectionState::Disconnected);

        match end {
            Ok(ConnectionEnd::Shutdown) => break,
            Ok(ConnectionEnd::Closed) => warn!(
                exchange = %exchange_id,
                connection_attempt,
                backoff_ms = settings.reconnect_delay.as_millis() as u64,
                action = "attempting re-connection after backoff",
                "exchange stream ended"
            ),
            Err(error) => error!(
                exchange = %exchange_id,
                %error,
                connection_attempt,
                backoff_ms = settings.reconnect_delay.as_millis() as u64,
                action = "attempting re-connection after backoff",
                "encountered a terminal error"
            ),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(settings.reconnect_delay) => {}
        }
    }

    info!(exchange = %exchange_id, "exchange connector stopped");
}

/// Run a single connection to completion.
async fn stream_connection<Exchange>(
    registry: &Arc<SymbolRegistry>,
    settings: &ConnectorSettings,
    subscriptions: &[ExchangeSubscription<Exchange::Channel>],
    outputs: &QuoteChannels,
    machine: &mut ConnectionMachine,
    shutdown: &CancellationToken,
) -> Result<ConnectionEnd, SocketError>
where
    Exchange: StreamConnector + Send,
{
    /*---------- Connecting ---------- */
    let websocket = tokio::select! {
        _ = shutdown.cancelled() => return Ok(ConnectionEnd::Shutdown),
        websocket = timeout(settings.idle_timeout, connect(settings.url.as_str())) => {
            websocket.map_err(|_| SocketError::Timeout(settings.idle_timeout))??
        }
    };

    /*---------- Subscribing ---------- */
    machine.transition(ConnectionState::Subscribing);
    let (mut ws_write, ws_read) = websocket.split();

    let requests = Exchange::requests(subscriptions);
    let subscribed = tokio::select! {
        _ = shutdown.cancelled() => None,
        result = timeout(settings.idle_timeout, send_requests(&mut ws_write, requests)) => {
            Some(result.map_err(|_| SocketError::Timeout(settings.idle_timeout)))
        }
    };

    match subscribed {
        Some(result) => result??,
        None => {
            close_connection(Exchange::ID, Some(ws_write)).await;
            return Ok(ConnectionEnd::Shutdown);
        }
    }

    // The ping task owns the writer for as long as the connection lives and
    // sends the Close frame itself once shutdown is cancelled
    let (mut ws_write, tasks) = match settings.ping_interval.clone() {
        Some(ping_interval) => (
            None,
            vec![tokio::spawn(schedule_pings_to_exchange(
                ws_write,
                ping_interval,
                shutdown.child_token(),
            ))],
        ),
        None => (Some(ws_write), Vec::new()),
    };

    let transformer =
        <Exchange::StreamTransformer as ExchangeTransformer<Exchange>>::init(Arc::clone(registry));
    let mut stream = ExchangeStream::new(ws_read, transformer, tasks, settings.idle_timeout);

    /*---------- Streaming ---------- */
    machine.transition(ConnectionState::Streaming);

    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => {
                stream.join_running_tasks(CLOSE_TIMEOUT).await;
                close_connection(Exchange::ID, ws_write.take()).await;
                return Ok(ConnectionEnd::Shutdown);
            }
            event = stream.next() => event,
        };

        match event {
            Some(Ok(market_event)) => apply_quote(outputs, market_event),

            // Transport failure or a silent exchange ends the connection
            Some(Err(error)) if error.is_terminal() => {
                stream.cancel_running_tasks();
                return Err(error);
            }

            // Anything else only invalidates the message it came from
            Some(Err(error)) => log_discarded(Exchange::ID, &error),

            None => return Ok(ConnectionEnd::Closed),
        }
    }
}

fn apply_quote(outputs: &QuoteChannels, market_event: MarketEvent<EventQuote>) {
    let MarketEvent {
        exchange_time,
        received_time,
        exchange,
        symbol,
        event_data,
    } = market_event;

    let quote = outputs.store.update(
        exchange,
        &symbol,
        event_data.bid,
        event_data.ask,
        received_time,
    );

    debug!(
        exchange = %exchange,
        symbol = %symbol,
        bid = ?quote.bid,
        ask = ?quote.ask,
        ?exchange_time,
        "quote updated"
    );

    if let Err(error) = outputs.quote_tx.send(QuoteUpdated { exchange, symbol }) {
        debug!(
            payload = ?error.0,
            why = "receiver dropped",
            "failed to send QuoteUpdated to evaluator"
        );
    }
}

fn log_discarded(exchange: ExchangeId, error: &SocketError) {
    match error {
        SocketError::Deserialise { .. }
        | SocketError::DeserialiseBinary { .. }
        | SocketError::UnknownChannel { .. } => debug!(
            exchange = %exchange,
            %error,
            action = "message discarded",
            "encountered a non-terminal error"
        ),
        _ => warn!(
            exchange = %exchange,
            %error,
            action = "message discarded",
            "encountered a non-terminal error"
        ),
    }
}

async fn close_connection(exchange: ExchangeId, ws_write: Option<WsWrite>) {
    if let Some(mut ws_write) = ws_write {
        match timeout(CLOSE_TIMEOUT, ws_write.send(WsMessage::Close(None))).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => debug!(exchange = %exchange, %error, "failed to send close frame"),
            Err(_) => debug!(exchange = %exchange, "timed out sending close frame"),
        }
    }
}

/*----- */
// Test
/*----- */
