// src/server/mod.rs

//! HTTP surface: build trigger, log and status queries.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::{info, warn};

pub use api::{AppState, SharedState, api_router};

use crate::build::BuildOrchestrator;

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    api_router().with_state(state)
}

/// Serve the API on `bind` until Ctrl-C, then cancel in-flight builds.
pub async fn start_server(bind: SocketAddr, orchestrator: BuildOrchestrator) -> Result<()> {
    let state = Arc::new(AppState {
        orchestrator: orchestrator.clone(),
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind to {bind}"))?;

    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "buildrunner listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    orchestrator.shutdown();
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; serving without signal handling");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
