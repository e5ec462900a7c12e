//! JSON-RPC 2.0 message model, method registry and dispatch.
//!
//! This crate owns the protocol shared by the `server` and the `cli` client.
//! It is transport-agnostic: callers hand it text (or parsed JSON) and send
//! back whatever [`dispatch::Reply`] it produces.

pub mod dispatch;
pub mod error;
pub mod message;
pub mod registry;

pub use dispatch::{Reply, handle_text, handle_value};
pub use error::{ProtocolError, RpcError};
pub use message::{Id, Message, PROTOCOL_VERSION, Request, Response};
pub use registry::{CallContext, MethodArgs, MethodRegistry, Transport};
