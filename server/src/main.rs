mod config;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use jsonrpc::MethodRegistry;
use tracing_subscriber::EnvFilter;

use crate::services::demo::{self, DemoState};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let ipsum = demo::load_ipsum(config.ipsum_path.as_deref()).await;
    let hub = state::Hub::new(config.broadcast_capacity);
    let registry = Arc::new(MethodRegistry::new());
    let demo_state = Arc::new(DemoState::new(ipsum));
    demo::register(&registry, &demo_state, &hub);
    tracing::info!(methods = registry.methods().len(), "methods registered");

    let state = state::AppState::new(registry, hub);
    let app = routes::app(state, &config.document_root);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        %addr,
        document_root = %config.document_root.display(),
        "jsonrpc server listening on http://{addr}"
    );

    let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = served {
        tracing::error!(error = %e, "server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
