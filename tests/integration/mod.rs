//! Integration tests for the bridge
//!
//! These tests verify that the hooks, registry, flattener and transports
//! work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod hooks_flow;
pub mod websocket_roundtrip;
