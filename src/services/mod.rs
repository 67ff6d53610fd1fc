//! Services Layer
//!
//! Business logic shared by the REST API handlers and the scheduler.
//! Handlers stay thin: they parse the request, call a service and wrap the
//! result.
//!
//! # Architecture
//!
//! ```text
//! REST API  ──────┐
//!                 ├──> Services --> ObservationStore / Ingestor / analytics
//! Scheduler ──────┘
//! ```
//!
//! # Services
//!
//! - `SnapshotService` - Latest row per key for a domain, plus freshness
//! - `RiskService` - Stored risk measures and live assessment
//! - `CommentaryService` - Market commentary from the quote snapshot
//! - `RefreshService` - Serialized ingestion cycles

pub mod snapshot_service;
pub mod risk_service;
pub mod commentary_service;
pub mod refresh_service;

pub use snapshot_service::{SnapshotResult, SnapshotService};
pub use risk_service::{RiskMeasuresResult, RiskService};
pub use commentary_service::{CommentaryResult, CommentaryService};
pub use refresh_service::RefreshService;
