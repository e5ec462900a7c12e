//! HTTP POST transport — one JSON-RPC message per request body.
//!
//! Calls answer `200` with the JSON-RPC response; notifications (and batches
//! made only of notifications) answer `204 No Content`.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use jsonrpc::{CallContext, MethodRegistry, Reply, Response as RpcResponse, RpcError, Transport};
use tracing::debug;

use crate::state::AppState;

pub async fn handle_post(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Response {
    let context = CallContext::new(Transport::Http, Some(peer.to_string()));
    process_body(&state.registry, &context, &body)
}

/// Dispatch one POST body and build the HTTP response.
///
/// A body that is not UTF-8 cannot be JSON and gets a parse error.
fn process_body(registry: &MethodRegistry, context: &CallContext, body: &[u8]) -> Response {
    debug!(peer = ?context.peer, len = body.len(), "post: recv body");
    let reply = match std::str::from_utf8(body) {
        Ok(text) => jsonrpc::handle_text(registry, context, text),
        Err(e) => {
            debug!(peer = ?context.peer, error = %e, "post: body is not utf-8");
            Some(Reply::Single(RpcResponse::failure(None, RpcError::parse_error())))
        }
    };
    match reply {
        Some(reply) => ([(CONTENT_TYPE, "application/json")], reply.to_text()).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[cfg(test)]
#[path = "post_test.rs"]
mod tests;
