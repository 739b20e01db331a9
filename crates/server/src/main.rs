//! HTTP server for the film catalog.
//!
//! Reads configuration, opens the configured storage backend, starts the
//! storage health check and serves the API until Ctrl-C.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use server::{AppState, Config, HealthMonitor, Storage, router, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    telemetry::init_logging(&config.log);

    info!(
        backend = ?config.storage.backend,
        addr = %config.bind_addr(),
        "Starting films server"
    );

    let storage = Storage::open(&config.storage).await?;

    let health = HealthMonitor::spawn(
        storage.films.clone(),
        Duration::from_secs(config.storage.health_check_interval_secs.max(1)),
    );

    let app = router(AppState::from_config(storage, &config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    health.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
