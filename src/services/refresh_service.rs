//! Refresh Service
//!
//! Runs ingestion cycles one at a time. The manual trigger waits for a
//! running cycle to finish; the scheduler skips its tick instead.

use crate::ingest::CycleReport;
use crate::state::AppState;
use tracing::info;

pub struct RefreshService;

impl RefreshService {
    /// Run a cycle now, waiting for any cycle already in progress
    pub async fn refresh_now(state: &AppState) -> CycleReport {
        let _guard = state.refresh_lock.lock().await;
        Self::run(state).await
    }

    /// Run a cycle unless one is already in progress
    pub async fn try_refresh(state: &AppState) -> Option<CycleReport> {
        let _guard = state.refresh_lock.try_lock().ok()?;
        Some(Self::run(state).await)
    }

    async fn run(state: &AppState) -> CycleReport {
        info!("RefreshService - starting ingestion cycle");
        let report = state.ingestor.run_cycle().await;
        info!(
            "RefreshService - cycle finished: {} batches, {} failures, lastUpdate {:?}",
            report.batches.len(),
            report.failures.len(),
            report.last_update
        );
        report
    }
}
