//! Private-equity metrics

use super::models::{Domain, PeMetric};
use super::snapshot::{self, FieldFilter, TableSpec};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

pub const SPEC: TableSpec = TableSpec {
    domain: Domain::PeMetrics,
    table: "pe_metrics",
    columns: &["metric", "strategy", "region", "value", "period", "timestamp"],
    key_columns: &["metric", "strategy", "region"],
    timestamp_column: "timestamp",
};

pub fn from_row(row: &Row<'_>) -> rusqlite::Result<PeMetric> {
    Ok(PeMetric {
        metric: row.get(0)?,
        strategy: row.get(1)?,
        region: row.get(2)?,
        value: row.get(3)?,
        period: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

/// Append one metric
pub fn insert(conn: &Connection, metric: &PeMetric) -> Result<()> {
    conn.execute(
        "INSERT INTO pe_metrics (metric, strategy, region, value, period, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            metric.metric,
            metric.strategy,
            metric.region,
            metric.value,
            metric.period,
            metric.timestamp,
        ],
    )?;
    Ok(())
}

/// Latest metric per (metric, strategy, region)
pub fn snapshot(conn: &Connection, filter: Option<&FieldFilter>) -> Result<Vec<PeMetric>> {
    snapshot::resolve(conn, &SPEC, filter, from_row)
}
