//! Methods exposed over JSON-RPC.
//!
//! Service modules own the state behind each method so the transports in
//! `routes` stay focused on framing and dispatch.

pub mod demo;
