use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

#[cfg(test)]
mod test_support;

use crate::config::settings::AppConfig;
use crate::infrastructure::queue::transcode::TranscodeQueue;
use crate::infrastructure::storage::local::StorageService;
use crate::modules::job::registry::{InMemoryJobRegistry, JobRegistry};
use crate::state::AppState;

/// How long queued and running encodes get to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting server...");

    let config = AppConfig::new();
    let storage = StorageService::new(&config.upload_dir, &config.output_dir)
        .await
        .context("Failed to create storage directories")?;
    let queue = TranscodeQueue::new(config.worker_count, config.queue_capacity);
    let registry: Arc<dyn JobRegistry> = Arc::new(InMemoryJobRegistry::new());

    let state = AppState::new(config, registry, storage, queue);

    let workers = workers::transcoder::start_transcoder_workers(state.clone());

    let app = app::create_app(state.clone());

    let addr = format!("0.0.0.0:{}", state.config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);
    info!("Ready to accept file uploads at POST /upload");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    workers::transcoder::drain_workers(&state, workers, SHUTDOWN_GRACE).await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
