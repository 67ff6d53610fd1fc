//! Periodic ingestion scheduler
//!
//! Runs an ingestion cycle immediately at start and then every
//! `interval`. A tick that arrives while a cycle is still running (for
//! example a manual refresh) is skipped rather than queued.

use crate::services::RefreshService;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Ingestion scheduler on a fixed interval
pub struct IngestScheduler {
    state: Arc<AppState>,
    interval: Duration,
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl IngestScheduler {
    pub fn new(state: Arc<AppState>, interval: Duration) -> Self {
        Self { state, interval }
    }

    /// Spawn the scheduler loop
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                "Ingest scheduler started, interval {}s",
                self.interval.as_secs()
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick().await,
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Ingest scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }

    async fn tick(&self) {
        match RefreshService::try_refresh(&self.state).await {
            Some(report) if !report.success() => {
                warn!(
                    "Scheduled cycle finished with {} failed domains",
                    report.failures.len()
                );
            }
            Some(_) => {}
            None => info!("Previous ingestion cycle still running, skipping tick"),
        }
    }
}

impl SchedulerHandle {
    /// Stop the loop and wait for the current cycle to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("Ingest scheduler task failed: {}", e);
        }
    }
}
