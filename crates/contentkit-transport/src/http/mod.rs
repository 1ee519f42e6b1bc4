//! HTTP transport implementation
//!
//! Provides a `reqwest`-backed client that implements the [`Transport`](crate::Transport)
//! trait. One call is one physical attempt.

pub mod client;

pub use client::{HttpTransport, HttpTransportConfig};
