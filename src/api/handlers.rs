//! REST API endpoint handlers
//!
//! Thin wrappers over the services layer. Errors convert to JSON responses
//! through `AppError`'s `IntoResponse`.

use crate::analytics::RiskAssessment;
use crate::api::types::*;
use crate::error::Result;
use crate::services::{
    CommentaryResult, CommentaryService, RefreshService, RiskMeasuresResult, RiskService,
    SnapshotResult, SnapshotService,
};
use crate::state::AppState;
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

/// Health check endpoint - GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

/// GET /api/last-update
pub async fn get_last_update(State(state): State<Arc<AppState>>) -> Json<LastUpdateResponse> {
    Json(LastUpdateResponse {
        last_update: SnapshotService::last_update(&state),
    })
}

/// GET /api/{domain}?field=value
pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
    Query(filters): Query<Vec<(String, String)>>,
) -> Result<Json<SnapshotResult>> {
    let result = SnapshotService::get_snapshot_by_name(&state, &domain, &filters)?;
    Ok(Json(result))
}

/// GET /api/commentary
pub async fn get_commentary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommentaryResult>> {
    Ok(Json(CommentaryService::get_commentary(&state)?))
}

/// GET /api/risk?asOfDate=YYYY-MM-DD
pub async fn get_risk_measures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RiskQuery>,
) -> Result<Json<RiskMeasuresResult>> {
    let result = RiskService::get_measures(&state, query.as_of_date.as_deref())?;
    Ok(Json(result))
}

/// GET /api/risk/assessment
pub async fn get_risk_assessment(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RiskAssessment>> {
    Ok(Json(RiskService::assess(&state)?))
}

/// POST /api/refresh
///
/// Waits for a scheduled cycle in progress, then runs a full cycle.
/// Source failures are reported in the body, not as an HTTP error.
pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<RefreshResponse> {
    info!("Manual refresh requested");
    let report = RefreshService::refresh_now(&state).await;
    Json(report.into())
}
