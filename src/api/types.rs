//! REST API types
//!
//! Field names follow the dashboard's JSON conventions (`lastUpdate`,
//! `asOfDate`).

use crate::ingest::{BatchFailure, BatchReport, CycleReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastUpdateResponse {
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

/// Query for `GET /api/risk`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskQuery {
    #[serde(rename = "asOfDate")]
    pub as_of_date: Option<String>,
}

/// Outcome of a manual refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
    pub batches: Vec<BatchReport>,
    pub failures: Vec<BatchFailure>,
}

impl From<CycleReport> for RefreshResponse {
    fn from(report: CycleReport) -> Self {
        Self {
            success: report.success(),
            last_update: report.last_update,
            batches: report.batches,
            failures: report.failures,
        }
    }
}
