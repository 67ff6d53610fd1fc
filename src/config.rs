//! Runtime configuration
//!
//! Every setting can be given as a flag or an environment variable. A `.env`
//! file in the working directory is loaded first, if present.

use crate::error::{AppError, Result};
use crate::ingest::RetryPolicy;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Financial dashboard backend
#[derive(Parser, Debug, Clone)]
#[command(name = "findash")]
#[command(version, about, long_about = None)]
pub struct AppConfig {
    /// SQLite database file
    #[arg(long, env = "FINDASH_DB_PATH", default_value = "findash.db")]
    pub db_path: PathBuf,

    /// Host address to bind to
    #[arg(long, env = "FINDASH_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "FINDASH_PORT", default_value_t = 8787)]
    pub port: u16,

    /// Seconds between scheduled ingestion cycles
    #[arg(long, env = "FINDASH_INGEST_INTERVAL_SECS", default_value_t = 300)]
    pub ingest_interval_secs: u64,

    /// Per-attempt timeout for external sources
    #[arg(long, env = "FINDASH_SOURCE_TIMEOUT_SECS", default_value_t = 10)]
    pub source_timeout_secs: u64,

    /// Attempts per source before falling back to the next one
    #[arg(long, env = "FINDASH_RETRY_ATTEMPTS", default_value_t = 3)]
    pub retry_attempts: u32,

    /// Backoff before the first retry; doubles on each further retry
    #[arg(long, env = "FINDASH_RETRY_BASE_DELAY_MS", default_value_t = 500)]
    pub retry_base_delay_ms: u64,

    /// JSON feed of market quotes, tried before the bundled data
    #[arg(long, env = "FINDASH_MARKETS_FEED_URL")]
    pub markets_feed_url: Option<String>,

    /// JSON feed of economic releases, tried before the bundled data
    #[arg(long, env = "FINDASH_ECONOMICS_FEED_URL")]
    pub economics_feed_url: Option<String>,

    /// Run one ingestion cycle and exit
    #[arg(long, env = "FINDASH_ONCE", default_value_t = false)]
    pub once: bool,
}

impl AppConfig {
    /// Load `.env`, parse flags and environment, then validate
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest_interval_secs == 0 {
            return Err(AppError::Config(
                "ingest interval must be at least one second".to_string(),
            ));
        }
        if self.source_timeout_secs == 0 {
            return Err(AppError::Config(
                "source timeout must be at least one second".to_string(),
            ));
        }
        if self.retry_attempts == 0 {
            return Err(AppError::Config(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        for url in [&self.markets_feed_url, &self.economics_feed_url]
            .into_iter()
            .flatten()
        {
            url::Url::parse(url)
                .map_err(|e| AppError::Config(format!("Invalid feed URL '{}': {}", url, e)))?;
        }
        Ok(())
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_secs(self.ingest_interval_secs)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
