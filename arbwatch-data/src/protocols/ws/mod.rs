pub mod poll_next;
pub mod ws_parser;

use std::fmt::Debug;

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt,
};
use serde_json::Value;
use tokio::{net::TcpStream, time::sleep, time::Duration};
use tokio_tungstenite::{
    connect_async, tungstenite::client::IntoClientRequest, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SocketError;

/*----- */
// Convenient types
/*----- */
pub type WsMessage = tokio_tungstenite::tungstenite::Message;
pub type WsError = tokio_tungstenite::tungstenite::Error;
pub type WebSocket = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsRead = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
pub type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
pub type JoinHandle = tokio::task::JoinHandle<()>;

pub async fn connect<R>(request: R) -> Result<WebSocket, SocketError>
where
    R: IntoClientRequest + Unpin + Debug,
{
    debug!(?request, "attempting to establish WebSocket connection");
    connect_async(request)
        .await
        .map(|(websocket, _)| websocket)
        .map_err(SocketError::WebSocketError)
}

pub async fn send_requests(
    ws_write: &mut WsWrite,
    requests: Vec<WsMessage>,
) -> Result<(), SocketError> {
    for request in requests {
        debug!(payload = ?request, "sending subscription request");
        ws_write.send(request).await?;
    }
    Ok(())
}

/// Owns the writer for the life of the connection. Cancelling `close` makes
/// the task send a Close frame and return.
pub async fn schedule_pings_to_exchange(
    mut ws_write: WsWrite,
    ping_interval: PingInterval,
    close: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = close.cancelled() => {
                if let Err(error) = ws_write.send(WsMessage::Close(None)).await {
                    debug!(%error, "failed to send close frame");
                }
                break;
            }
            _ = sleep(ping_interval.time) => {
                if let Err(error) = ws_write
                    .send(WsMessage::Text(ping_interval.message.to_string()))
                    .await
                {
                    debug!(%error, "failed to send application ping, stopping ping task");
                    break;
                }
            }
        }
    }
}

/*----- */
// Models
/*----- */
#[derive(Clone, Debug)]
pub struct PingInterval {
    pub time: Duration,
    pub message: Value,
}
