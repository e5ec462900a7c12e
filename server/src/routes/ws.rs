//! WebSocket handler — JSON-RPC over text frames.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, subscribes to the hub, and enters a
//! `select!` loop:
//! - Incoming text frames → `jsonrpc::handle_text` → reply frame if any
//! - Hub notifications → forward to client
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → log open with `client_id`
//! 2. Client sends calls/notifications → dispatch → reply (calls only)
//! 3. Server-side state changes arrive as hub notifications
//! 4. Close or socket error → unsubscribe → log close

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use jsonrpc::{CallContext, MethodRegistry, Transport};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let context = CallContext::new(Transport::WebSocket, Some(client_id.to_string()));
    let mut notifications = state.hub.subscribe();

    info!(%client_id, connected = state.hub.connected(), "ws: connection opened");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(%client_id, error = %e, "ws: connection error");
                        break;
                    }
                };
                match msg {
                    Message::Text(text) => {
                        let Some(reply) = process_inbound_text(&state.registry, &context, &text) else {
                            continue;
                        };
                        if send_text(&mut socket, client_id, reply).await.is_err() {
                            break;
                        }
                    }
                    Message::Binary(bytes) => {
                        warn!(%client_id, len = bytes.len(), "ws: ignoring binary frame");
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            note = notifications.recv() => {
                match note {
                    Ok(text) => {
                        if send_text(&mut socket, client_id, text).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%client_id, skipped, "ws: client lagging, notifications dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    state.hub.unsubscribe();
    info!(%client_id, "ws: connection closed");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Handle one inbound text frame and return the reply text, if any.
///
/// Kept apart from the socket loop so tests can drive dispatch directly.
fn process_inbound_text(registry: &MethodRegistry, context: &CallContext, text: &str) -> Option<String> {
    debug!(peer = ?context.peer, len = text.len(), "ws: recv frame");
    let reply = jsonrpc::handle_text(registry, context, text)?;
    Some(reply.to_text())
}

async fn send_text(socket: &mut WebSocket, client_id: Uuid, text: String) -> Result<(), axum::Error> {
    debug!(%client_id, len = text.len(), "ws: send frame");
    socket.send(Message::Text(text.into())).await.inspect_err(|e| {
        warn!(%client_id, error = %e, "ws: send failed");
    })
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
