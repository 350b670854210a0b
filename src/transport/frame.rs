//! JSON text frames exchanged with the inspector.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::Envelope;

/// Bridge → inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Envelope { envelope: Envelope },
    Reply { id: u64, event: String, data: Value },
    Pong,
}

/// Inspector → bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Request { id: u64, event: String },
    Ping,
}

impl InboundFrame {
    pub fn request(id: u64, event: impl Into<String>) -> Self {
        InboundFrame::Request {
            id,
            event: event.into(),
        }
    }
}
