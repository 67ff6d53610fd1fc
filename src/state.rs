//! Application state management

use crate::analytics::{ParametricVar, RiskModel};
use crate::config::AppConfig;
use crate::db::sqlite::ObservationStore;
use crate::error::Result;
use crate::ingest::{sources, Ingestor, SourceChain};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared by the HTTP handlers and the scheduler
pub struct AppState {
    pub config: AppConfig,

    /// Observation store (SQLite)
    pub store: Arc<ObservationStore>,

    /// Ingestor wired to the configured source chains
    pub ingestor: Arc<Ingestor>,

    /// Model used for on-demand risk assessment
    pub risk_model: Arc<dyn RiskModel>,

    /// Held for the duration of an ingestion cycle; cycles never overlap
    pub refresh_lock: Mutex<()>,
}

impl AppState {
    /// Open the database and build the default source chains
    pub fn new(config: AppConfig) -> Result<Self> {
        let store = Arc::new(ObservationStore::open(&config.db_path)?);
        let chains = sources::default_chains(&config)?;

        tracing::info!("Database opened at {:?}", config.db_path);

        Ok(Self::with_parts(config, store, chains))
    }

    /// Assemble state from an existing store and chains
    pub fn with_parts(
        config: AppConfig,
        store: Arc<ObservationStore>,
        chains: Vec<SourceChain>,
    ) -> Self {
        let risk_model: Arc<dyn RiskModel> = Arc::new(ParametricVar::default());
        let ingestor = Arc::new(Ingestor::new(store.clone(), chains, risk_model.clone()));

        Self {
            config,
            store,
            ingestor,
            risk_model,
            refresh_lock: Mutex::new(()),
        }
    }
}
