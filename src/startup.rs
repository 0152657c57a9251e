//! Server startup and graceful shutdown.

use std::net::SocketAddr;

use axum::Router;
use tracing::info;

use crate::error::AppError;

pub async fn serve(app: Router, port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to bind {}: {}", addr, e)))?;

    info!(address = %addr, "submission-service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("Failed to install shutdown signal handler");
        return;
    }
    info!("Shutdown signal received");
}
