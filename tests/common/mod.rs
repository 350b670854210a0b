//! Shared test utilities for the bridge
//!
//! - Bridge construction over the in-memory transport
//! - A small mock application (two pages sharing one store)

pub mod fixtures;
