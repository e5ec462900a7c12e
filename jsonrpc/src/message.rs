//! Request and response objects.
//!
//! DESIGN
//! ======
//! Messages are read from and written to `serde_json::Value` by hand rather
//! than through derived impls: the protocol distinguishes "member absent" from
//! "member is null" (`result: null` is a valid success, `id: null` marks a
//! notification), which derived `Option` fields cannot express.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, RpcError};

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

pub const PROTOCOL_VERSION: &str = "2.0";

const VERSION_TAG: &str = "jsonrpc";
const ID_TAG: &str = "id";
const METHOD_TAG: &str = "method";
const PARAMS_TAG: &str = "params";
const RESULT_TAG: &str = "result";
const ERROR_TAG: &str = "error";

// =============================================================================
// ID
// =============================================================================

/// Correlation id chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    Number(i64),
    String(String),
}

impl Id {
    /// Read an id slot. `Ok(None)` means null; other non-id types are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidId`] for booleans, floats, arrays and objects.
    pub fn from_json(value: &Value) -> Result<Option<Self>, ProtocolError> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(Self::String(s.clone()))),
            Value::Number(n) => n.as_i64().map(|n| Some(Self::Number(n))).ok_or(ProtocolError::InvalidId),
            _ => Err(ProtocolError::InvalidId),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

fn id_to_json(id: Option<&Id>) -> Value {
    id.map_or(Value::Null, Id::to_json)
}

fn check_version(json: &Map<String, Value>) -> Result<(), ProtocolError> {
    match json.get(VERSION_TAG) {
        Some(Value::String(v)) if v == PROTOCOL_VERSION => Ok(()),
        Some(Value::String(v)) => Err(ProtocolError::UnsupportedVersion(v.clone())),
        _ => Err(ProtocolError::MissingVersion),
    }
}

// =============================================================================
// REQUEST
// =============================================================================

/// A call (with id) or a notification (without).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: Option<Id>,
    pub method: String,
    /// `Value::Null` when the request carried no params.
    pub params: Value,
}

impl Request {
    /// A request that expects exactly one response.
    pub fn call(id: impl Into<Id>, method: impl Into<String>, params: Value) -> Self {
        Self { id: Some(id.into()), method: method.into(), params }
    }

    /// A one-way message. The receiver never replies.
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self { id: None, method: method.into(), params }
    }

    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(VERSION_TAG.into(), Value::String(PROTOCOL_VERSION.into()));
        if let Some(id) = &self.id {
            out.insert(ID_TAG.into(), id.to_json());
        }
        out.insert(METHOD_TAG.into(), Value::String(self.method.clone()));
        if !self.params.is_null() {
            out.insert(PARAMS_TAG.into(), self.params.clone());
        }
        Value::Object(out)
    }

    /// Read a request object.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] naming the first missing or malformed member.
    pub fn from_json(json: &Value) -> Result<Self, ProtocolError> {
        let Value::Object(obj) = json else {
            return Err(ProtocolError::NotAnObject);
        };
        check_version(obj)?;

        let Some(Value::String(method)) = obj.get(METHOD_TAG) else {
            return Err(ProtocolError::MissingMethod);
        };
        let id = match obj.get(ID_TAG) {
            Some(value) => Id::from_json(value)?,
            None => None,
        };
        let params = obj.get(PARAMS_TAG).cloned().unwrap_or(Value::Null);

        Ok(Self { id, method: method.clone(), params })
    }

    /// Parse a request from raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] for malformed JSON, otherwise as [`Request::from_json`].
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        let json: Value = serde_json::from_str(text)?;
        Self::from_json(&json)
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// The single reply to a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// `None` only when the request id could not be determined.
    pub id: Option<Id>,
    pub outcome: Result<Value, RpcError>,
}

impl Response {
    #[must_use]
    pub fn success(id: Option<Id>, result: Value) -> Self {
        Self { id, outcome: Ok(result) }
    }

    #[must_use]
    pub fn failure(id: Option<Id>, error: RpcError) -> Self {
        Self { id, outcome: Err(error) }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert(VERSION_TAG.into(), Value::String(PROTOCOL_VERSION.into()));
        out.insert(ID_TAG.into(), id_to_json(self.id.as_ref()));
        match &self.outcome {
            Ok(result) => out.insert(RESULT_TAG.into(), result.clone()),
            Err(error) => out.insert(ERROR_TAG.into(), error.to_json()),
        };
        Value::Object(out)
    }

    /// Read a response object.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] when the version or id is missing, or when
    /// the object carries neither `result` nor `error`.
    pub fn from_json(json: &Value) -> Result<Self, ProtocolError> {
        let Value::Object(obj) = json else {
            return Err(ProtocolError::NotAnObject);
        };
        check_version(obj)?;

        let id = Id::from_json(obj.get(ID_TAG).ok_or(ProtocolError::MissingId)?)?;

        if let Some(result) = obj.get(RESULT_TAG) {
            return Ok(Self::success(id, result.clone()));
        }
        if let Some(error) = obj.get(ERROR_TAG) {
            return Ok(Self::failure(id, RpcError::from_json(error)));
        }
        Err(ProtocolError::MissingOutcome)
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// INBOUND MESSAGE
// =============================================================================

/// A message arriving at a client: a reply to one of its calls, or a
/// server-initiated notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Response(Response),
    Notification(Request),
}

impl Message {
    /// Classify one inbound JSON object. Objects with a `method` member are
    /// notifications; everything else must be a response.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError`] when the value is neither.
    pub fn from_json(json: &Value) -> Result<Self, ProtocolError> {
        if json.get(METHOD_TAG).is_some() {
            return Request::from_json(json).map(Self::Notification);
        }
        Response::from_json(json).map(Self::Response)
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
