//! Snapshot Service
//!
//! Resolves the latest row per key for a domain and attaches `lastUpdate`.

use crate::db::sqlite::{Domain, FieldFilter, Record};
use crate::error::{AppError, Result};
use crate::state::AppState;
use serde::Serialize;
use tracing::debug;

/// Snapshot rows with the store-wide freshness stamp
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotResult {
    pub data: Vec<Record>,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

/// Snapshot service for business logic
pub struct SnapshotService;

impl SnapshotService {
    /// Latest rows for `domain`, narrowed by at most one equality filter
    pub fn get_snapshot(
        state: &AppState,
        domain: Domain,
        filters: &[(String, String)],
    ) -> Result<SnapshotResult> {
        let filter = Self::parse_filter(filters)?;
        debug!("SnapshotService::get_snapshot - {} {:?}", domain, filter);

        let data = state.store.snapshot(domain, filter.as_ref())?;

        Ok(SnapshotResult {
            data,
            last_update: state.store.last_update(),
        })
    }

    /// Latest rows for a domain given by name or URL alias
    pub fn get_snapshot_by_name(
        state: &AppState,
        name: &str,
        filters: &[(String, String)],
    ) -> Result<SnapshotResult> {
        let domain: Domain = name.parse()?;
        Self::get_snapshot(state, domain, filters)
    }

    pub fn last_update(state: &AppState) -> Option<String> {
        state.store.last_update()
    }

    fn parse_filter(filters: &[(String, String)]) -> Result<Option<FieldFilter>> {
        match filters {
            [] => Ok(None),
            [(column, value)] => Ok(Some(FieldFilter::text(column.as_str(), value.as_str()))),
            _ => Err(AppError::Validation(
                "At most one filter field is supported".to_string(),
            )),
        }
    }
}
