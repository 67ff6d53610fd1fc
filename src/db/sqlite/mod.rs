//! SQLite observation store
//!
//! One append-only table per domain (positions are upserted by id), pooled
//! connections for concurrent readers, and a generic snapshot resolver for
//! "latest row per key" reads.

pub mod models;
pub mod snapshot;
pub mod freshness;
mod migrations;
mod markets;
mod economics;
mod pe_metrics;
mod positions;
mod risk;

use crate::error::Result;
use freshness::FreshnessIndex;
pub use models::*;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
pub use snapshot::{FieldFilter, TableSpec};
use std::collections::HashMap;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;
type DbConnection = PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 8;

/// Table description for a domain
pub fn table_spec(domain: Domain) -> &'static TableSpec {
    match domain {
        Domain::Markets => &markets::SPEC,
        Domain::Economics => &economics::SPEC,
        Domain::PeMetrics => &pe_metrics::SPEC,
        Domain::Positions => &positions::SPEC,
        Domain::RiskMeasures => &risk::SPEC,
    }
}

/// Durable store for every observation domain
pub struct ObservationStore {
    pool: DbPool,
    freshness: FreshnessIndex,
}

impl ObservationStore {
    /// Open (or create) the store at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            // Enable WAL mode for better concurrent access
            conn.execute_batch(
                "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;",
            )
        });
        let pool = Pool::builder().max_size(POOL_SIZE).build(manager)?;

        tracing::info!("Opened observation store at {:?}", path);
        Self::from_pool(pool)
    }

    /// Private in-memory store. A single connection keeps every caller on
    /// the same database.
    pub fn open_in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())?;
        Self::from_pool(pool)
    }

    fn from_pool(pool: DbPool) -> Result<Self> {
        let store = Self {
            pool,
            freshness: FreshnessIndex::new(),
        };

        let conn = store.conn()?;
        migrations::run_migrations(&conn)?;
        for domain in Domain::ALL {
            if let Some(ts) = snapshot::max_timestamp(&conn, table_spec(domain))? {
                store.freshness.advance(domain, &ts);
            }
        }
        drop(conn);

        Ok(store)
    }

    fn conn(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    // ========== Write Methods ==========

    /// Validate and write one record.
    ///
    /// The caller supplies the timestamp. Positions are upserted by id;
    /// every other domain appends a new row.
    pub fn append(&self, record: Record) -> Result<()> {
        self.append_batch(vec![record]).map(|_| ())
    }

    /// Validate every record, then write them all in one transaction.
    ///
    /// A validation failure rejects the whole batch before anything is
    /// written; readers see either none or all of the batch.
    pub fn append_batch(&self, mut records: Vec<Record>) -> Result<usize> {
        for record in records.iter_mut() {
            record.validate()?;
        }
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for record in &records {
            write_record(&tx, record)?;
        }
        tx.commit()?;

        let mut newest: HashMap<Domain, &str> = HashMap::new();
        for record in &records {
            let entry = newest.entry(record.domain()).or_insert(record.timestamp());
            if record.timestamp() > *entry {
                *entry = record.timestamp();
            }
        }
        for (domain, ts) in newest {
            if domain == Domain::Positions {
                // An upsert can replace the newest row with an older one
                let latest = snapshot::max_timestamp(&conn, table_spec(domain))?;
                self.freshness.replace(domain, latest);
            } else {
                self.freshness.advance(domain, ts);
            }
        }

        Ok(records.len())
    }

    // ========== Snapshot Methods ==========

    /// Latest row per key for `domain`, optionally narrowed by one equality
    /// filter applied after the latest row has been chosen.
    pub fn snapshot(&self, domain: Domain, filter: Option<&FieldFilter>) -> Result<Vec<Record>> {
        let conn = self.conn()?;
        let records = match domain {
            Domain::Markets => markets::snapshot(&conn, filter)?
                .into_iter()
                .map(Record::Market)
                .collect(),
            Domain::Economics => economics::snapshot(&conn, filter)?
                .into_iter()
                .map(Record::Economic)
                .collect(),
            Domain::PeMetrics => pe_metrics::snapshot(&conn, filter)?
                .into_iter()
                .map(Record::PeMetric)
                .collect(),
            Domain::Positions => positions::snapshot(&conn, filter)?
                .into_iter()
                .map(Record::Position)
                .collect(),
            Domain::RiskMeasures => risk::snapshot(&conn, filter)?
                .into_iter()
                .map(Record::Risk)
                .collect(),
        };
        Ok(records)
    }

    /// Raw rows matching every equality term, no deduplication
    pub fn query(&self, domain: Domain, predicate: &[FieldFilter]) -> Result<Vec<Record>> {
        let conn = self.conn()?;
        let spec = table_spec(domain);
        let records = match domain {
            Domain::Markets => snapshot::query(&conn, spec, predicate, markets::from_row)?
                .into_iter()
                .map(Record::Market)
                .collect(),
            Domain::Economics => snapshot::query(&conn, spec, predicate, economics::from_row)?
                .into_iter()
                .map(Record::Economic)
                .collect(),
            Domain::PeMetrics => snapshot::query(&conn, spec, predicate, pe_metrics::from_row)?
                .into_iter()
                .map(Record::PeMetric)
                .collect(),
            Domain::Positions => snapshot::query(&conn, spec, predicate, positions::from_row)?
                .into_iter()
                .map(Record::Position)
                .collect(),
            Domain::RiskMeasures => snapshot::query(&conn, spec, predicate, risk::from_row)?
                .into_iter()
                .map(Record::Risk)
                .collect(),
        };
        Ok(records)
    }

    pub fn market_snapshot(&self, filter: Option<&FieldFilter>) -> Result<Vec<MarketQuote>> {
        let conn = self.conn()?;
        markets::snapshot(&conn, filter)
    }

    pub fn economic_snapshot(&self, filter: Option<&FieldFilter>) -> Result<Vec<EconomicRelease>> {
        let conn = self.conn()?;
        economics::snapshot(&conn, filter)
    }

    pub fn pe_metric_snapshot(&self, filter: Option<&FieldFilter>) -> Result<Vec<PeMetric>> {
        let conn = self.conn()?;
        pe_metrics::snapshot(&conn, filter)
    }

    pub fn position_snapshot(&self, filter: Option<&FieldFilter>) -> Result<Vec<Position>> {
        let conn = self.conn()?;
        positions::snapshot(&conn, filter)
    }

    // ========== Risk Methods ==========

    /// Latest risk measure per bucket for `as_of_date`
    pub fn risk_measures_for_date(&self, as_of_date: &str) -> Result<Vec<RiskMeasure>> {
        let conn = self.conn()?;
        risk::for_date(&conn, as_of_date)
    }

    pub fn latest_risk_as_of_date(&self) -> Result<Option<String>> {
        let conn = self.conn()?;
        risk::latest_as_of_date(&conn)
    }

    // ========== Freshness Methods ==========

    /// Newest timestamp across all domains' latest rows
    pub fn last_update(&self) -> Option<String> {
        self.freshness.overall()
    }

    pub fn domain_last_update(&self, domain: Domain) -> Option<String> {
        self.freshness.get(domain)
    }
}

fn write_record(conn: &Connection, record: &Record) -> Result<()> {
    match record {
        Record::Market(r) => markets::insert(conn, r),
        Record::Economic(r) => economics::insert(conn, r),
        Record::PeMetric(r) => pe_metrics::insert(conn, r),
        Record::Position(r) => positions::upsert(conn, r),
        Record::Risk(r) => risk::insert(conn, r),
    }
}
