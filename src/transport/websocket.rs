//! WebSocket transport to the inspector endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio_tungstenite::tungstenite::Message;

use crate::bridge::Envelope;
use crate::transport::frame::{InboundFrame, OutboundFrame};
use crate::transport::{InboundRequest, RequestHandler, Transport, TransportError};

type Handlers = Arc<RwLock<HashMap<String, Vec<RequestHandler>>>>;

/// Where replies go: the outbound queue, tagged with the connection they
/// belong to. Holds no strong sender, so pending requests never keep the
/// connection task alive.
#[derive(Clone)]
struct ReplyRoute {
    queue: WeakUnboundedSender<OutboundFrame>,
    connection: Arc<AtomicU64>,
}

impl ReplyRoute {
    fn new(queue: WeakUnboundedSender<OutboundFrame>) -> Self {
        Self {
            queue,
            connection: Arc::new(AtomicU64::new(0)),
        }
    }

    fn current(&self) -> u64 {
        self.connection.load(Ordering::Acquire)
    }

    fn reconnected(&self) {
        self.connection.fetch_add(1, Ordering::AcqRel);
    }

    fn send(&self, frame: OutboundFrame) -> bool {
        self.queue
            .upgrade()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }
}

/// Lazily connected WebSocket client.
///
/// The first `emit` or `on` spawns a background task on the current tokio
/// runtime that owns the socket. Frames queued while the socket is down are
/// discarded; the task reconnects after `reconnect_delay`. Dropping the
/// transport closes the queue and ends the task.
pub struct WebSocketTransport {
    url: String,
    reconnect_delay: Duration,
    handlers: Handlers,
    outbound: OnceLock<UnboundedSender<OutboundFrame>>,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            outbound: OnceLock::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_started(&self) -> bool {
        self.outbound.get().is_some()
    }

    fn outbound(&self) -> Result<&UnboundedSender<OutboundFrame>, TransportError> {
        if let Some(tx) = self.outbound.get() {
            return Ok(tx);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        Ok(self.outbound.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tracing::debug!(url = %self.url, "Starting inspector connection task");
            runtime.spawn(run_connection(
                self.url.clone(),
                self.reconnect_delay,
                self.handlers.clone(),
                rx,
                ReplyRoute::new(tx.downgrade()),
            ));
            tx
        }))
    }
}

impl Transport for WebSocketTransport {
    fn emit(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.outbound()?
            .send(OutboundFrame::Envelope { envelope })
            .map_err(|_| TransportError::Closed)
    }

    fn on(&self, event: &str, handler: RequestHandler) -> Result<(), TransportError> {
        self.handlers
            .write()
            .entry(event.to_string())
            .or_default()
            .push(handler);
        self.outbound().map(|_| ())
    }
}

async fn run_connection(
    url: String,
    reconnect_delay: Duration,
    handlers: Handlers,
    mut outbound: UnboundedReceiver<OutboundFrame>,
    replies: ReplyRoute,
) {
    loop {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                replies.reconnected();
                tracing::info!(url = %url, "Connected to inspector");
                let (mut sink, mut source) = stream.split();

                loop {
                    tokio::select! {
                        frame = outbound.recv() => {
                            let Some(frame) = frame else {
                                // Transport dropped.
                                if let Err(error) = sink.close().await {
                                    tracing::debug!(error = %error, "Failed to close inspector socket");
                                }
                                return;
                            };
                            let json = match serde_json::to_string(&frame) {
                                Ok(json) => json,
                                Err(error) => {
                                    tracing::error!(error = %error, "Failed to serialize frame");
                                    continue;
                                }
                            };
                            if let Err(error) = sink.send(Message::Text(json.into())).await {
                                tracing::warn!(error = %error, "Failed to send frame to inspector");
                                break;
                            }
                        }
                        message = source.next() => {
                            match message {
                                Some(Ok(Message::Text(text))) => {
                                    dispatch_inbound(text.as_str(), &handlers, &replies);
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(error)) => {
                                    tracing::warn!(error = %error, "Inspector socket error");
                                    break;
                                }
                            }
                        }
                    }
                }
                tracing::info!(url = %url, "Disconnected from inspector");
            }
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "Failed to connect to inspector");
            }
        }

        if !discard_for(&mut outbound, reconnect_delay).await {
            return;
        }
    }
}

/// Drop queued frames for `delay`. Returns `false` once the queue is closed.
async fn discard_for(outbound: &mut UnboundedReceiver<OutboundFrame>, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    let mut dropped = 0usize;
    loop {
        tokio::select! {
            _ = &mut sleep => {
                if dropped > 0 {
                    tracing::debug!(dropped, "Dropped frames while inspector was unreachable");
                }
                return true;
            }
            frame = outbound.recv() => {
                if frame.is_none() {
                    return false;
                }
                dropped += 1;
            }
        }
    }
}

fn dispatch_inbound(text: &str, handlers: &Handlers, replies: &ReplyRoute) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(error) => {
            tracing::debug!(error = %error, "Ignoring malformed inspector frame");
            return;
        }
    };

    match frame {
        InboundFrame::Ping => {
            if !replies.send(OutboundFrame::Pong) {
                tracing::debug!("Failed to queue pong");
            }
        }
        InboundFrame::Request { id, event } => {
            let handlers = handlers.read();
            let Some(list) = handlers.get(&event) else {
                tracing::debug!(event = %event, "No handler registered for inspector request");
                return;
            };
            let connection = replies.current();
            for handler in list {
                let route = replies.clone();
                let name = event.clone();
                handler(InboundRequest::new(event.as_str(), move |data| {
                    // Ids are per connection; a new socket never asked for this.
                    if route.current() != connection {
                        tracing::debug!(id, "Dropping reply for a previous connection");
                        return;
                    }
                    if !route.send(OutboundFrame::Reply { id, event: name, data }) {
                        tracing::debug!(id, "Connection closed before reply was sent");
                    }
                }));
            }
        }
    }
}
