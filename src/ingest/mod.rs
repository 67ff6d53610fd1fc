//! Ingestion
//!
//! Record sources produce batches for one domain; the ingestor stamps each
//! batch with a single timestamp and commits it to the observation store.
//!
//! ```text
//! SourceChain [http feed -> static] --fetch--> Ingestor --append_batch--> ObservationStore
//! ```

mod chain;
mod ingestor;
pub mod sources;

pub use chain::{Acquired, RecordSource, RetryPolicy, SourceChain};
pub use ingestor::{BatchClock, BatchFailure, BatchReport, CycleReport, Ingestor};
