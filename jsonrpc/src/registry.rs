//! Method registry — named remote methods and call processing.
//!
//! DESIGN
//! ======
//! Methods are plain closures stored behind `Arc` so a call can clone its
//! handler out of the map and release the lock before running it. Handlers
//! may therefore register or unregister methods themselves, and a slow
//! handler never blocks lookups from other connections.
//!
//! A handler that panics is reported to the caller as an internal error; the
//! registry does not hold its lock across the call, so it stays usable.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::error::RpcError;
use crate::message::{Request, Response};

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Transport a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    WebSocket,
    Http,
    Local,
}

/// Who is calling. Passed to every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub transport: Transport,
    /// Transport-specific caller label (connection id, remote address).
    pub peer: Option<String>,
}

impl CallContext {
    #[must_use]
    pub fn new(transport: Transport, peer: Option<String>) -> Self {
        Self { transport, peer }
    }

    #[must_use]
    pub fn local() -> Self {
        Self::new(Transport::Local, None)
    }
}

/// Arguments handed to a method that accepts parameters.
#[derive(Debug, Clone)]
pub struct MethodArgs {
    /// The request params; `Value::Null` when none were sent.
    pub params: Value,
    pub context: CallContext,
}

// =============================================================================
// HANDLERS
// =============================================================================

pub type MethodFn = dyn Fn(&MethodArgs) -> Result<Value, RpcError> + Send + Sync;
pub type NoArgFn = dyn Fn(&CallContext) + Send + Sync;

#[derive(Clone)]
enum Handler {
    WithArgs(Arc<MethodFn>),
    NoArgs(Arc<NoArgFn>),
}

#[derive(Clone)]
struct Method {
    description: Value,
    handler: Handler,
}

const NO_PARAMS_MESSAGE: &str = "This method does not support parameters.";

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Default)]
pub struct MethodRegistry {
    methods: RwLock<BTreeMap<String, Method>>,
}

impl MethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method that receives params and returns a result.
    ///
    /// The description is advertised by [`MethodRegistry::methods`]. An
    /// existing method with the same name is replaced.
    pub fn register_method<F>(&self, name: impl Into<String>, description: impl Into<Value>, handler: F)
    where
        F: Fn(&MethodArgs) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.insert(name.into(), description.into(), Handler::WithArgs(Arc::new(handler)));
    }

    /// Register a method that takes no params. Its result is always `null`,
    /// and calling it with params is an invalid request.
    pub fn register_no_arg<F>(&self, name: impl Into<String>, description: impl Into<Value>, handler: F)
    where
        F: Fn(&CallContext) + Send + Sync + 'static,
    {
        self.insert(name.into(), description.into(), Handler::NoArgs(Arc::new(handler)));
    }

    /// Remove a method. Returns `false` if no such method was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Name → description of every registered method.
    #[must_use]
    pub fn methods(&self) -> BTreeMap<String, Value> {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, method)| (name.clone(), method.description.clone()))
            .collect()
    }

    /// Run a request and build its response. The response id mirrors the request.
    pub fn process_call(&self, request: &Request, context: &CallContext) -> Response {
        let id = request.id.clone();
        let outcome = self.invoke(request, context);
        Response { id, outcome }
    }

    /// Run a notification. The outcome is discarded, including errors.
    pub fn process_notification(&self, request: &Request, context: &CallContext) {
        let _ = self.invoke(request, context);
    }

    fn insert(&self, name: String, description: Value, handler: Handler) {
        self.methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Method { description, handler });
    }

    fn lookup(&self, name: &str) -> Option<Handler> {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|method| method.handler.clone())
    }

    fn invoke(&self, request: &Request, context: &CallContext) -> Result<Value, RpcError> {
        let Some(handler) = self.lookup(&request.method) else {
            return Err(RpcError::method_not_found().with_data(request.to_json()));
        };

        let run = || match &handler {
            Handler::WithArgs(f) => {
                let args = MethodArgs { params: request.params.clone(), context: context.clone() };
                f(&args)
            }
            Handler::NoArgs(f) => {
                if !request.params.is_null() {
                    return Err(RpcError::invalid_request()
                        .with_message(NO_PARAMS_MESSAGE)
                        .with_data(request.to_json()));
                }
                f(context);
                Ok(Value::Null)
            }
        };

        catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "method panicked".to_owned());
            Err(RpcError::internal(message).with_data(request.to_json()))
        })
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
