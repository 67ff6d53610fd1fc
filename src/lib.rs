//! Findash - Financial Dashboard Backend
//!
//! Ingests market, economic, private-equity and portfolio observations into
//! append-only SQLite tables, resolves the latest row per entity on read,
//! and derives bucket-level risk and market commentary from those
//! snapshots.

pub mod analytics;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod scheduler;
pub mod services;
pub mod state;

use api::ApiServer;
use config::AppConfig;
use scheduler::IngestScheduler;
use services::RefreshService;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from `RUST_LOG`, defaulting to debug for this crate
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "findash=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the backend until Ctrl-C, or a single ingestion cycle with `--once`
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Findash v{}...", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        db_path = %config.db_path.display(),
        bind = %config.bind_addr(),
        interval_secs = config.ingest_interval_secs,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(config.clone())?);

    if config.once {
        let report = RefreshService::refresh_now(&state).await;
        tracing::info!(
            "Single cycle complete: {} batches, {} failures",
            report.batches.len(),
            report.failures.len()
        );
        if !report.success() {
            anyhow::bail!("{} domains failed to ingest", report.failures.len());
        }
        return Ok(());
    }

    let mut server = ApiServer::new(state.clone());
    server.start(&config.bind_addr()).await?;

    let scheduler = IngestScheduler::new(state.clone(), config.ingest_interval()).start();

    tracing::info!("Application state initialized");
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    scheduler.shutdown().await;
    server.shutdown().await;

    tracing::info!("Findash stopped");
    Ok(())
}
