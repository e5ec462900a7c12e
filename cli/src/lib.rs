//! Native JSON-RPC client for the demo server.
//!
//! Speaks to `/ws` over WebSocket and falls back to `POST /post` when the
//! socket cannot be opened.

pub mod client;

pub use client::{Client, ClientConfig, ClientError, ClientHooks, NoHooks, post_url, ws_url};
