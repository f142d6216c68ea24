//! Liveness endpoint
//!
//! A single `GET /health` route answering `200 OK` while the process is
//! alive. It reports nothing about reconciliation: a failing tick keeps the
//! endpoint green, only process death takes it down.

use anyhow::{Context, Result};
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Build the health router
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Serve the health endpoint on `0.0.0.0:port`
pub async fn serve(port: u16) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind health endpoint on port {}", port))?;
    tracing::info!(%port, "health endpoint listening");
    serve_on(listener).await
}

/// Serve the health endpoint on an already-bound listener
pub async fn serve_on(listener: TcpListener) -> Result<()> {
    axum::serve(listener, router())
        .await
        .context("health endpoint terminated")
}
