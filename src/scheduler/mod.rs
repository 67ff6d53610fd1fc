//! Scheduler module
//!
//! Handles scheduled tasks:
//! - Periodic ingestion, once at start and then on a fixed interval

mod ingest_scheduler;

pub use ingest_scheduler::{IngestScheduler, SchedulerHandle};
