//! Read-only status surface.
//!
//! Serves endpoint stats and queue state to pollers. Handlers only read
//! in-memory snapshots, so polling frequency is not a concern.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::manager::RpcManager;
use self::handlers::*;

pub fn setup_status_router(manager: Arc<RpcManager>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/status/endpoints", get(get_endpoints))
        .route("/status/queue", get(get_queue))
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

/// Serve the status router until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    manager: Arc<RpcManager>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Status server starting");

    axum::serve(listener, setup_status_router(manager))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Status server stopped");
    Ok(())
}
