//! Minimal inspector endpoint.
//!
//! Accepts bridge connections over WebSocket, asks each one for a full
//! snapshot on connect and republishes every frame it receives.

mod handler;
pub mod server;

pub use server::{build_router, run_server, serve, InspectorConfig, InspectorState};
