//! Risk Service
//!
//! Serves stored risk measures by as-of date and runs the risk model
//! against the live position snapshot.

use crate::analytics::RiskAssessment;
use crate::db::sqlite::{normalize_date, RiskMeasure};
use crate::error::Result;
use crate::state::AppState;
use serde::Serialize;
use tracing::info;

/// Stored measures for one as-of date
#[derive(Debug, Clone, Serialize)]
pub struct RiskMeasuresResult {
    #[serde(rename = "asOfDate")]
    pub as_of_date: Option<String>,
    pub data: Vec<RiskMeasure>,
    #[serde(rename = "lastUpdate")]
    pub last_update: Option<String>,
}

/// Risk service for business logic
pub struct RiskService;

impl RiskService {
    /// Latest measure per bucket for `as_of_date`, or for the latest stored
    /// date when none is given
    pub fn get_measures(state: &AppState, as_of_date: Option<&str>) -> Result<RiskMeasuresResult> {
        let as_of_date = match as_of_date {
            Some(date) => Some(normalize_date(date)?),
            None => state.store.latest_risk_as_of_date()?,
        };

        let data = match &as_of_date {
            Some(date) => state.store.risk_measures_for_date(date)?,
            None => Vec::new(),
        };

        Ok(RiskMeasuresResult {
            as_of_date,
            data,
            last_update: state.store.last_update(),
        })
    }

    /// Run the risk model on the current position snapshot without storing
    pub fn assess(state: &AppState) -> Result<RiskAssessment> {
        let positions = state.store.position_snapshot(None)?;
        info!(
            "RiskService::assess - {} positions with {}",
            positions.len(),
            state.risk_model.id()
        );
        Ok(state.risk_model.assess(&positions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::Domain;
    use crate::error::AppError;
    use crate::state::test_support::in_memory_state;

    #[tokio::test]
    async fn test_no_measures_before_first_cycle() {
        let state = in_memory_state();
        let result = RiskService::get_measures(&state, None).unwrap();
        assert_eq!(result.as_of_date, None);
        assert!(result.data.is_empty());
        assert!(matches!(
            RiskService::assess(&state).unwrap(),
            RiskAssessment::InsufficientData { .. }
        ));
    }

    #[tokio::test]
    async fn test_latest_date_used_when_omitted() {
        let state = in_memory_state();
        state.ingestor.run_cycle().await;

        let latest = RiskService::get_measures(&state, None).unwrap();
        let date = latest.as_of_date.clone().unwrap();
        let explicit = RiskService::get_measures(&state, Some(&date)).unwrap();

        assert!(!latest.data.is_empty());
        assert_eq!(latest.data, explicit.data);
        assert!(RiskService::get_measures(&state, Some("1999-01-01"))
            .unwrap()
            .data
            .is_empty());
    }

    #[tokio::test]
    async fn test_repeated_cycles_serve_one_row_per_bucket() {
        let state = in_memory_state();
        state.ingestor.run_cycle().await;
        let second = state.ingestor.run_cycle().await;

        let result = RiskService::get_measures(&state, None).unwrap();
        let mut buckets: Vec<&str> = result.data.iter().map(|m| m.bucket.as_str()).collect();
        buckets.sort();
        buckets.dedup();
        assert_eq!(result.data.len(), buckets.len());

        let risk_ts = second
            .batches
            .iter()
            .find(|b| b.domain == Domain::RiskMeasures)
            .map(|b| b.timestamp.clone())
            .unwrap();
        assert!(result.data.iter().all(|m| m.timestamp == risk_ts));
    }

    #[tokio::test]
    async fn test_bad_date_rejected() {
        let state = in_memory_state();
        let err = RiskService::get_measures(&state, Some("yesterday")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_assess_matches_stored_buckets() {
        let state = in_memory_state();
        state.ingestor.run_cycle().await;

        let stored = RiskService::get_measures(&state, None).unwrap().data;
        match RiskService::assess(&state).unwrap() {
            RiskAssessment::Computed { buckets } => {
                assert_eq!(buckets.len(), stored.len());
            }
            other => panic!("unexpected assessment {:?}", other),
        }
    }
}
