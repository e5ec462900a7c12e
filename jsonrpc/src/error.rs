//! Error codes and error objects.
//!
//! `RpcError` is what travels inside an error response. `ProtocolError` is the
//! local reason a JSON value could not be read as a request or response; the
//! dispatch layer turns it into an `RpcError` before anything is sent.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

// =============================================================================
// CODES
// =============================================================================

/// Not an error. Never sent on the wire.
pub const NONE: i64 = 0;

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

/// Lower and upper bound of the implementation-defined server error range.
pub const SERVER_ERROR_MIN: i64 = -32099;
pub const SERVER_ERROR_MAX: i64 = -32000;

const CODE_TAG: &str = "code";
const MESSAGE_TAG: &str = "message";
const DATA_TAG: &str = "data";

/// Default human-readable message for an error code.
#[must_use]
pub fn default_message(code: i64) -> &'static str {
    match code {
        NONE => "No error",
        PARSE_ERROR => "Parse error",
        INVALID_REQUEST => "Invalid Request",
        METHOD_NOT_FOUND => "Method not found",
        INVALID_PARAMS => "Invalid params",
        INTERNAL_ERROR => "Internal error",
        SERVER_ERROR_MIN..=SERVER_ERROR_MAX => "Server error",
        _ => "Unknown error",
    }
}

// =============================================================================
// RPC ERROR
// =============================================================================

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    /// Create an error whose message is the default for `code`.
    #[must_use]
    pub fn new(code: i64) -> Self {
        Self { code, message: default_message(code).to_owned(), data: None }
    }

    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(PARSE_ERROR)
    }

    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(INVALID_REQUEST)
    }

    #[must_use]
    pub fn method_not_found() -> Self {
        Self::new(METHOD_NOT_FOUND)
    }

    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS).with_message(message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR).with_message(message)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach additional data. A JSON `null` clears it.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = if data.is_null() { None } else { Some(data) };
        self
    }

    /// Serialize to the wire object. Empty messages and null data are omitted.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(CODE_TAG.into(), Value::from(self.code));
        if !self.message.is_empty() {
            out.insert(MESSAGE_TAG.into(), Value::String(self.message.clone()));
        }
        if let Some(data) = self.data.as_ref().filter(|d| !d.is_null()) {
            out.insert(DATA_TAG.into(), data.clone());
        }
        Value::Object(out)
    }

    /// Read an error object.
    ///
    /// Never fails: a value without an integer `code` is itself reported as a
    /// parse error, and a missing `message` falls back to the code default.
    #[must_use]
    pub fn from_json(json: &Value) -> Self {
        let Some(code) = json.get(CODE_TAG).and_then(Value::as_i64) else {
            return Self::parse_error();
        };

        let mut error = Self::new(code);
        if let Some(message) = json.get(MESSAGE_TAG).and_then(Value::as_str) {
            error.message = message.to_owned();
        }
        if let Some(data) = json.get(DATA_TAG) {
            error = error.with_data(data.clone());
        }
        error
    }
}

impl Serialize for RpcError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// PROTOCOL ERROR
// =============================================================================

/// Why a JSON value is not a well-formed JSON-RPC message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("no version string")]
    MissingVersion,
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),
    #[error("no method")]
    MissingMethod,
    #[error("id must be a string, a number or null")]
    InvalidId,
    #[error("no id")]
    MissingId,
    #[error("no result or error")]
    MissingOutcome,
    #[error("empty batch")]
    EmptyBatch,
}

impl ProtocolError {
    /// The error object reported to the peer for this failure.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            Self::Json(_) => RpcError::parse_error(),
            _ => RpcError::invalid_request().with_data(Value::String(self.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
