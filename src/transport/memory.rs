//! In-process transport that records traffic instead of sending it.
//!
//! Cloning shares the same recording, so a test can hand one clone to the
//! bridge and inspect the other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::bridge::Envelope;
use crate::transport::{InboundRequest, RequestHandler, Transport, TransportError};

#[derive(Default)]
struct Recording {
    envelopes: Mutex<Vec<Envelope>>,
    replies: Arc<Mutex<Vec<(String, Value)>>>,
    handlers: Mutex<HashMap<String, Vec<RequestHandler>>>,
    connected: AtomicBool,
    connects: AtomicUsize,
    offline: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Recording>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, `emit` fails with [`TransportError::Closed`] and the
    /// envelope is lost.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.inner.envelopes.lock().clone()
    }

    pub fn take_envelopes(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.inner.envelopes.lock())
    }

    /// `(event, data)` for every answered request, in answer order.
    pub fn replies(&self) -> Vec<(String, Value)> {
        self.inner.replies.lock().clone()
    }

    /// How many times a connection was established.
    pub fn connection_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Deliver an inbound request to every handler registered for `event`.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, event: &str) -> usize {
        let handlers = self.inner.handlers.lock();
        let Some(list) = handlers.get(event) else {
            tracing::debug!(event, "No handler registered for inbound request");
            return 0;
        };
        for handler in list {
            let replies = self.inner.replies.clone();
            let name = event.to_string();
            handler(InboundRequest::new(event, move |data| {
                replies.lock().push((name, data));
            }));
        }
        list.len()
    }

    fn connect(&self) {
        if !self.inner.connected.swap(true, Ordering::SeqCst) {
            self.inner.connects.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Transport for MemoryTransport {
    fn emit(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.connect();
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.inner.envelopes.lock().push(envelope);
        Ok(())
    }

    fn on(&self, event: &str, handler: RequestHandler) -> Result<(), TransportError> {
        self.connect();
        self.inner
            .handlers
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }
}
