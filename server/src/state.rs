//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the method registry shared by every transport and the `Hub` used to
//! push server-initiated notifications to all connected WebSocket clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use jsonrpc::{MethodRegistry, Request};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

// =============================================================================
// HUB
// =============================================================================

/// Fan-out of serialized JSON-RPC notifications to live WebSocket clients.
#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<String>,
    connected: Arc<AtomicUsize>,
}

impl Hub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, connected: Arc::new(AtomicUsize::new(0)) }
    }

    /// Register a connection. The returned receiver yields every notification
    /// sent after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.connected.fetch_add(1, Ordering::Relaxed);
        self.tx.subscribe()
    }

    /// Counterpart of [`Hub::subscribe`], called when a connection ends.
    pub fn unsubscribe(&self) {
        self.connected.fetch_sub(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }

    /// Send a notification to every connected client. Best-effort: with no
    /// subscribers the message is dropped.
    pub fn notify_all(&self, method: &str, params: Value) {
        let text = Request::notification(method, params).to_json().to_string();
        if self.tx.send(text).is_err() {
            debug!(method, "hub: no subscribers");
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum — all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MethodRegistry>,
    pub hub: Hub,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Arc<MethodRegistry>, hub: Hub) -> Self {
        Self { registry, hub }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
