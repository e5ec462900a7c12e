//! Transport-agnostic message handling: raw text in, optional reply out.
//!
//! Both the WebSocket and the HTTP POST routes feed inbound text through
//! [`handle_text`]. A `None` reply means there is nothing to send back
//! (notifications, or a batch made only of notifications).

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::message::{Id, Request, Response};
use crate::registry::{CallContext, MethodRegistry};

/// What to send back for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
}

impl Reply {
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Single(response) => response.to_json(),
            Self::Batch(responses) => Value::Array(responses.iter().map(Response::to_json).collect()),
        }
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Parse, route and answer one inbound text message.
pub fn handle_text(registry: &MethodRegistry, context: &CallContext, text: &str) -> Option<Reply> {
    let json: Value = match serde_json::from_str(text) {
        Ok(json) => json,
        Err(e) => {
            let error = ProtocolError::from(e).to_rpc_error();
            return Some(Reply::Single(Response::failure(None, error)));
        }
    };
    handle_value(registry, context, &json)
}

/// Route an already-parsed message (single object or batch).
pub fn handle_value(registry: &MethodRegistry, context: &CallContext, json: &Value) -> Option<Reply> {
    match json {
        Value::Array(items) if items.is_empty() => Some(Reply::Single(Response::failure(
            None,
            ProtocolError::EmptyBatch.to_rpc_error(),
        ))),
        Value::Array(items) => {
            let responses: Vec<Response> = items
                .iter()
                .filter_map(|item| handle_single(registry, context, item))
                .collect();
            if responses.is_empty() { None } else { Some(Reply::Batch(responses)) }
        }
        other => handle_single(registry, context, other).map(Reply::Single),
    }
}

fn handle_single(registry: &MethodRegistry, context: &CallContext, json: &Value) -> Option<Response> {
    match Request::from_json(json) {
        Ok(request) if request.is_notification() => {
            registry.process_notification(&request, context);
            None
        }
        Ok(request) => Some(registry.process_call(&request, context)),
        Err(e) => Some(Response::failure(recover_id(json), e.to_rpc_error())),
    }
}

/// Best-effort id of a request that failed validation, so the caller can
/// still correlate the error.
fn recover_id(json: &Value) -> Option<Id> {
    json.get("id").and_then(|id| Id::from_json(id).ok().flatten())
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
