//! REST API server module
//!
//! Read-only snapshot endpoints for the dashboard plus the manual refresh
//! trigger:
//!
//! - `GET  /health`
//! - `GET  /api/last-update`
//! - `GET  /api/commentary`
//! - `GET  /api/risk?asOfDate=YYYY-MM-DD`
//! - `GET  /api/risk/assessment`
//! - `POST /api/refresh`
//! - `GET  /api/{domain}?field=value`

mod server;
pub mod handlers;
mod types;

pub use server::{router, ApiServer};
pub use types::{
    HealthResponse,
    LastUpdateResponse,
    RefreshResponse,
    RiskQuery,
};
