//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries both JSON-RPC transports (WebSocket at `/ws`,
//! HTTP POST at `/post`), a method listing, a health check, and the demo page
//! served as static files from the document root for every other path.

pub mod post;
pub mod ws;

use std::collections::BTreeMap;
use std::path::Path;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post as post_route};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub const WS_PATH: &str = "/ws";
pub const POST_PATH: &str = "/post";

/// JSON-RPC routes and the demo page.
pub fn app(state: AppState, document_root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(document_root).append_index_html_on_directories(true);

    Router::new()
        .route(WS_PATH, get(ws::handle_ws))
        .route(POST_PATH, post_route(post::handle_post))
        .route("/api/methods", get(list_methods))
        .route("/healthz", get(healthz))
        .fallback_service(static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct MethodList {
    methods: BTreeMap<String, Value>,
}

async fn list_methods(State(state): State<AppState>) -> Json<MethodList> {
    Json(MethodList { methods: state.registry.methods() })
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
