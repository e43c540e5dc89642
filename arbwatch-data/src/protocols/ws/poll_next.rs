use futures::Stream;
use pin_project::{pin_project, pinned_drop};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::{sleep, Instant, Sleep};

use super::{
    ws_parser::{StreamParser, WebSocketParser},
    JoinHandle, WsRead,
};
use crate::{error::SocketError, transformer::Transformer};

/*----- */
// Exchange Stream
/*----- */
#[derive(Debug)]
#[pin_project(PinnedDrop)]
pub struct ExchangeStream<StreamTransformer>
where
    StreamTransformer: Transformer,
{
    #[pin]
    pub ws_read: WsRead,
    pub transformer: StreamTransformer,
    pub tasks: Vec<JoinHandle>,
    idle_timeout: Duration,
    idle_deadline: Pin<Box<Sleep>>,
}

impl<StreamTransformer> ExchangeStream<StreamTransformer>
where
    StreamTransformer: Transformer,
{
    /// Any frame from the exchange, including pings and heartbeats, pushes the
    /// idle deadline back by `idle_timeout`.
    pub fn new(
        stream: WsRead,
        transformer: StreamTransformer,
        tasks: Vec<JoinHandle>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            ws_read: stream,
            transformer,
            tasks,
            idle_timeout,
            idle_deadline: Box::pin(sleep(idle_timeout)),
        }
    }

    pub fn cancel_running_tasks(&self) {
        self.tasks.iter().for_each(|task| {
            task.abort();
        })
    }

    /// Wait up to `wait` for each task to finish on its own, aborting the ones
    /// that do not.
    pub async fn join_running_tasks(&mut self, wait: Duration) {
        for task in self.tasks.drain(..) {
            let abort = task.abort_handle();
            if tokio::time::timeout(wait, task).await.is_err() {
                abort.abort();
            }
        }
    }
}

// Tasks tied to the connection (e.g. pings) must not outlive it
#[pinned_drop]
impl<StreamTransformer> PinnedDrop for ExchangeStream<StreamTransformer>
where
    StreamTransformer: Transformer,
{
    fn drop(self: Pin<&mut Self>) {
        self.cancel_running_tasks();
    }
}

/*----- */
// Poll next implementation
/*----- */
impl<StreamTransformer> Stream for ExchangeStream<StreamTransformer>
where
    StreamTransformer: Transformer,
    StreamTransformer::Error: From<SocketError>,
{
    type Item = Result<StreamTransformer::Output, StreamTransformer::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            // Poll inner `Stream` for next the next input protocol message
            let input = match this.ws_read.as_mut().poll_next(cx) {
                Poll::Ready(Some(input)) => input,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => {
                    if this.idle_deadline.as_mut().poll(cx).is_ready() {
                        let idle_timeout = *this.idle_timeout;
                        this.idle_deadline
                            .as_mut()
                            .reset(Instant::now() + idle_timeout);
                        return Poll::Ready(Some(Err(SocketError::Timeout(idle_timeout).into())));
                    }
                    return Poll::Pending;
                }
            };

            this.idle_deadline
                .as_mut()
                .reset(Instant::now() + *this.idle_timeout);

            // Parse input protocol message into `ExchangeMessage`
            let exchange_message = match WebSocketParser::parse::<StreamTransformer::Input>(input) {
                // `StreamParser` successfully deserialised `ExchangeMessage`
                Some(Ok(exchange_message)) => exchange_message,

                // If `StreamParser` returns an Err pass it downstream
                Some(Err(err)) => return Poll::Ready(Some(Err(err.into()))),

                // If `StreamParser` returns None it's a safe-to-skip message
                None => continue,
            };

            // Messages that carry no quote are skipped here
            match this.transformer.transform(exchange_message) {
                Ok(Some(output)) => return Poll::Ready(Some(Ok(output))),
                Ok(None) => continue,
                Err(error) => return Poll::Ready(Some(Err(error))),
            }
        }
    }
}
