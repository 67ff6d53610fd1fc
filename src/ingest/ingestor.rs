//! Batch ingestion

use super::chain::SourceChain;
use crate::analytics::{RiskAssessment, RiskModel};
use crate::db::sqlite::{format_timestamp, Domain, ObservationStore, Record};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Issues batch timestamps that strictly increase, even when two batches
/// start within the same microsecond or the wall clock steps backwards.
#[derive(Debug, Default)]
pub struct BatchClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl BatchClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock whose first timestamp is later than `after` (a stored timestamp)
    pub fn starting_after(after: Option<&str>) -> Self {
        let last = after
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));
        Self {
            last: Mutex::new(last),
        }
    }

    pub fn next_instant(&self) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + ChronoDuration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }

    /// Next timestamp in stored form
    pub fn next(&self) -> String {
        format_timestamp(self.next_instant())
    }
}

/// One committed batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub domain: Domain,
    pub source: String,
    pub records: usize,
    pub timestamp: String,
}

/// One batch that did not commit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub domain: Domain,
    pub error: String,
}

/// Result of a full ingestion cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub batches: Vec<BatchReport>,
    pub failures: Vec<BatchFailure>,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

impl CycleReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pulls records from source chains and commits them as timestamped batches
pub struct Ingestor {
    store: Arc<ObservationStore>,
    chains: Vec<SourceChain>,
    risk_model: Arc<dyn RiskModel>,
    clock: BatchClock,
}

impl Ingestor {
    pub fn new(
        store: Arc<ObservationStore>,
        chains: Vec<SourceChain>,
        risk_model: Arc<dyn RiskModel>,
    ) -> Self {
        let clock = BatchClock::starting_after(store.last_update().as_deref());
        Self {
            store,
            chains,
            risk_model,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<ObservationStore> {
        &self.store
    }

    pub fn risk_model(&self) -> &Arc<dyn RiskModel> {
        &self.risk_model
    }

    /// Acquire one batch from `chain` and commit it.
    ///
    /// The timestamp is captured once, before acquisition, and shared by
    /// every record. The batch is written in a single transaction, so a
    /// failed batch leaves nothing behind; re-running it writes a newer
    /// timestamp that supersedes any earlier batch.
    pub async fn run_batch(&self, chain: &SourceChain) -> Result<BatchReport> {
        let timestamp = self.clock.next();
        let acquired = chain.acquire().await?;

        let mut records = acquired.records;
        for record in records.iter_mut() {
            record.set_timestamp(&timestamp);
        }

        let written = self.store.append_batch(records)?;
        info!(
            "Committed {} batch from {}: {} records at {}",
            chain.domain(),
            acquired.source,
            written,
            timestamp
        );

        Ok(BatchReport {
            domain: chain.domain(),
            source: acquired.source,
            records: written,
            timestamp,
        })
    }

    /// Run every configured chain, then refresh risk measures.
    ///
    /// A failing domain is logged and reported; it never stops the other
    /// domains or propagates to the caller.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let results = join_all(self.chains.iter().map(|chain| self.run_batch(chain))).await;
        for (chain, result) in self.chains.iter().zip(results) {
            match result {
                Ok(batch) => report.batches.push(batch),
                Err(e) => {
                    if e.is_source_failure() {
                        warn!("Skipping {} batch: {}", chain.domain(), e);
                    } else {
                        error!("{} batch aborted: {}", chain.domain(), e);
                    }
                    report.failures.push(BatchFailure {
                        domain: chain.domain(),
                        error: e.to_string(),
                    });
                }
            }
        }

        match self.run_risk_batch() {
            Ok(Some(batch)) => report.batches.push(batch),
            Ok(None) => {}
            Err(e) => {
                error!("Risk batch aborted: {}", e);
                report.failures.push(BatchFailure {
                    domain: Domain::RiskMeasures,
                    error: e.to_string(),
                });
            }
        }

        report.last_update = self.store.last_update();
        report
    }

    /// Compute risk from the current position snapshot and store it under
    /// today's as-of date. Returns `None` when there are no positions.
    pub fn run_risk_batch(&self) -> Result<Option<BatchReport>> {
        let positions = self.store.position_snapshot(None)?;
        let assessment = self.risk_model.assess(&positions);

        if let RiskAssessment::InsufficientData { reason } = &assessment {
            info!("Skipping risk batch: {}", reason);
            return Ok(None);
        }

        let instant = self.clock.next_instant();
        let timestamp = format_timestamp(instant);
        let as_of_date = instant.date_naive().format("%Y-%m-%d").to_string();

        let records: Vec<Record> = assessment
            .to_measures(&as_of_date, &timestamp)
            .into_iter()
            .map(Record::Risk)
            .collect();
        if records.is_empty() {
            return Err(AppError::Internal(
                "Risk model produced no measures for a non-empty portfolio".to_string(),
            ));
        }

        let written = self.store.append_batch(records)?;
        info!(
            "Committed risk batch from {}: {} buckets for {}",
            self.risk_model.id(),
            written,
            as_of_date
        );

        Ok(Some(BatchReport {
            domain: Domain::RiskMeasures,
            source: self.risk_model.id().to_string(),
            records: written,
            timestamp,
        }))
    }
}
