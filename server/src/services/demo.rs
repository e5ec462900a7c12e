//! Demo methods — the remote procedures behind the demo page controls.
//!
//! DESIGN
//! ======
//! Handlers are small synchronous closures over a shared `DemoState`. State
//! that several connections can write (user text, last random number) sits
//! behind a `Mutex`; counters are atomics. Changes made by one client are
//! pushed to every connected client through the `Hub` as notifications.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use jsonrpc::{CallContext, MethodArgs, MethodRegistry, RpcError};
use rand::Rng;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::state::Hub;

/// Maximum characters returned by `get-text`.
pub const TEXT_CHUNK_CHARS: usize = 140;

/// Upper bound (exclusive) of generated random numbers.
pub const RANDOM_NUMBER_MAX: f64 = 255.0;

pub const RANDOM_NUMBER_CHANGED: &str = "random-number-changed";
pub const USER_TEXT_CHANGED: &str = "user-text-changed";

const BUILTIN_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation \
ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in reprehenderit in \
voluptate velit esse cillum dolore eu fugiat nulla pariatur. Excepteur sint occaecat cupidatat non \
proident, sunt in culpa qui officia deserunt mollit anim id est laborum. Sed ut perspiciatis unde omnis \
iste natus error sit voluptatem accusantium doloremque laudantium, totam rem aperiam, eaque ipsa quae ab \
illo inventore veritatis et quasi architecto beatae vitae dicta sunt explicabo. Nemo enim ipsam \
voluptatem quia voluptas sit aspernatur aut odit aut fugit, sed quia consequuntur magni dolores eos qui \
ratione voluptatem sequi nesciunt.";

// =============================================================================
// STATE
// =============================================================================

pub struct DemoState {
    ipsum: String,
    user_text: Mutex<String>,
    random_number: Mutex<Option<f64>>,
    pings: AtomicU64,
    pongs: AtomicU64,
}

impl DemoState {
    #[must_use]
    pub fn new(ipsum: String) -> Self {
        Self {
            ipsum,
            user_text: Mutex::new(String::new()),
            random_number: Mutex::new(None),
            pings: AtomicU64::new(0),
            pongs: AtomicU64::new(0),
        }
    }

    /// A random chunk of the ipsum text.
    #[must_use]
    pub fn random_text(&self) -> String {
        let chars = self.ipsum.chars().count();
        if chars == 0 {
            return String::new();
        }
        let start = rand::rng().random_range(0..chars);
        text_chunk(&self.ipsum, start, TEXT_CHUNK_CHARS)
    }

    #[must_use]
    pub fn user_text(&self) -> String {
        self.user_text.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_user_text(&self, text: &str) {
        *self.user_text.lock().unwrap_or_else(PoisonError::into_inner) = text.to_owned();
    }

    #[must_use]
    pub fn random_number(&self) -> Option<f64> {
        *self.random_number.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_random_number(&self, value: f64) {
        *self.random_number.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    #[must_use]
    pub fn pings(&self) -> u64 {
        self.pings.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn pongs(&self) -> u64 {
        self.pongs.load(Ordering::Relaxed)
    }
}

/// Up to `max_chars` characters of `text` starting at character `start`.
/// Shorter near the end of the text; empty when `start` is past the end.
#[must_use]
pub fn text_chunk(text: &str, start: usize, max_chars: usize) -> String {
    text.chars().skip(start).take(max_chars).collect()
}

/// Read the `get-text` source, falling back to the built-in text.
pub async fn load_ipsum(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return BUILTIN_IPSUM.to_owned();
    };
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            info!(path = %path.display(), chars = text.chars().count(), "demo: loaded ipsum text");
            text
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "demo: ipsum unreadable, using built-in text");
            BUILTIN_IPSUM.to_owned()
        }
    }
}

// =============================================================================
// PARAMS
// =============================================================================

/// Accepts `"text"`, `["text"]` or `{"text": "text"}`.
fn text_param(params: &Value) -> Option<&str> {
    match params {
        Value::String(s) => Some(s),
        Value::Array(items) if items.len() == 1 => items[0].as_str(),
        Value::Object(obj) => obj.get("text").and_then(Value::as_str),
        _ => None,
    }
}

/// Accepts `12.5`, `[12.5]` or `{"value": 12.5}`.
fn number_param(params: &Value) -> Option<f64> {
    match params {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) if items.len() == 1 => items[0].as_f64(),
        Value::Object(obj) => obj.get("value").and_then(Value::as_f64),
        _ => None,
    }
}

// =============================================================================
// REGISTRATION
// =============================================================================

/// Register every demo method on `registry`.
pub fn register(registry: &MethodRegistry, demo: &Arc<DemoState>, hub: &Hub) {
    registry.register_method(
        "get-random-number",
        "Returns a random number between 0 and 255.",
        |_args: &MethodArgs| {
            let value = rand::rng().random_range(0.0..RANDOM_NUMBER_MAX);
            debug!(value, "demo: get-random-number");
            Ok(json!(value))
        },
    );

    let state = Arc::clone(demo);
    let notify = hub.clone();
    registry.register_method(
        "set-random-number",
        "Stores a number chosen by the client.",
        move |args: &MethodArgs| {
            let value = number_param(&args.params).ok_or_else(|| RpcError::invalid_params("number expected"))?;
            state.set_random_number(value);
            debug!(value, peer = ?args.context.peer, "demo: set-random-number");
            notify.notify_all(RANDOM_NUMBER_CHANGED, json!({ "value": value }));
            Ok(Value::Null)
        },
    );

    let state = Arc::clone(demo);
    registry.register_method(
        "get-text",
        "Returns a random chunk of text to the client.",
        move |_args: &MethodArgs| {
            let text = state.random_text();
            debug!(%text, "demo: get-text");
            Ok(Value::String(text))
        },
    );

    let state = Arc::clone(demo);
    let notify = hub.clone();
    registry.register_method("set-text", "Sets text from the user.", move |args: &MethodArgs| {
        let text = text_param(&args.params).ok_or_else(|| RpcError::invalid_params("text expected"))?;
        state.set_user_text(text);
        info!(%text, peer = ?args.context.peer, "demo: user text set");
        notify.notify_all(USER_TEXT_CHANGED, json!({ "text": text }));
        Ok(Value::Null)
    });

    let state = Arc::clone(demo);
    registry.register_no_arg("ping", "Send a JSONRPC Ping Notification", move |ctx: &CallContext| {
        let count = state.pings.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(count, peer = ?ctx.peer, "ping'd");
    });

    let state = Arc::clone(demo);
    registry.register_no_arg("pong", "Send a JSONRPC Pong Notification", move |ctx: &CallContext| {
        let count = state.pongs.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(count, peer = ?ctx.peer, "pong'd");
    });
}

#[cfg(test)]
#[path = "demo_test.rs"]
mod tests;
