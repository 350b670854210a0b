//! Duplex channel to the inspector.
//!
//! `emit` queues and returns; it never waits on the inspector. Connection
//! setup is lazy: the first `emit` or `on` establishes it and later calls
//! reuse it.

pub mod frame;
pub mod memory;
pub mod websocket;

use serde_json::Value;

use crate::bridge::Envelope;

pub use frame::{InboundFrame, OutboundFrame};
pub use memory::MemoryTransport;
pub use websocket::WebSocketTransport;

/// Handler for one inbound request type. Runs on whatever thread the
/// transport receives on.
pub type RequestHandler = Box<dyn Fn(InboundRequest) + Send + Sync>;

/// Errors surfaced by [`Transport`]. All are non-fatal to the host.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No tokio runtime to drive the connection.
    #[error("No async runtime available for the inspector connection")]
    NoRuntime,

    /// The connection task is gone or the channel is offline.
    #[error("Inspector channel closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An inbound request with its reply continuation.
pub struct InboundRequest {
    pub event: String,
    responder: Box<dyn FnOnce(Value) + Send>,
}

impl InboundRequest {
    pub fn new(event: impl Into<String>, responder: impl FnOnce(Value) + Send + 'static) -> Self {
        Self {
            event: event.into(),
            responder: Box::new(responder),
        }
    }

    /// Answer the request. Consumes it; a request is answered at most once.
    pub fn respond(self, data: Value) {
        (self.responder)(data)
    }
}

impl std::fmt::Debug for InboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundRequest")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

pub trait Transport: Send + Sync {
    /// Queue `envelope` for delivery.
    fn emit(&self, envelope: Envelope) -> Result<(), TransportError>;

    /// Register `handler` for inbound requests named `event`.
    fn on(&self, event: &str, handler: RequestHandler) -> Result<(), TransportError>;
}
