//! Risk measures per liquidity bucket

use super::models::{Domain, RiskMeasure};
use super::snapshot::{self, FieldFilter, TableSpec};
use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub const SPEC: TableSpec = TableSpec {
    domain: Domain::RiskMeasures,
    table: "risk_measures",
    columns: &["as_of_date", "bucket", "var_99", "stress_pl", "scenario", "timestamp"],
    key_columns: &["as_of_date", "bucket"],
    timestamp_column: "timestamp",
};

pub fn from_row(row: &Row<'_>) -> rusqlite::Result<RiskMeasure> {
    Ok(RiskMeasure {
        as_of_date: row.get(0)?,
        bucket: row.get(1)?,
        var_99: row.get(2)?,
        stress_pl: row.get(3)?,
        scenario: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

/// Append one measure
pub fn insert(conn: &Connection, measure: &RiskMeasure) -> Result<()> {
    conn.execute(
        "INSERT INTO risk_measures (as_of_date, bucket, var_99, stress_pl, scenario, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            measure.as_of_date,
            measure.bucket,
            measure.var_99,
            measure.stress_pl,
            measure.scenario,
            measure.timestamp,
        ],
    )?;
    Ok(())
}

/// Latest measure per (as_of_date, bucket)
pub fn snapshot(conn: &Connection, filter: Option<&FieldFilter>) -> Result<Vec<RiskMeasure>> {
    snapshot::resolve(conn, &SPEC, filter, from_row)
}

/// Latest measure per bucket for one as-of date.
///
/// Every ingestion cycle re-runs the model for today, so a date collects
/// one batch per cycle; only the newest row per bucket is current.
pub fn for_date(conn: &Connection, as_of_date: &str) -> Result<Vec<RiskMeasure>> {
    let filter = FieldFilter::text("as_of_date", as_of_date);
    snapshot::resolve(conn, &SPEC, Some(&filter), from_row)
}

/// Most recent as-of date that has measures
pub fn latest_as_of_date(conn: &Connection) -> Result<Option<String>> {
    let date = conn
        .query_row("SELECT MAX(as_of_date) FROM risk_measures", [], |row| {
            row.get::<_, Option<String>>(0)
        })
        .optional()?
        .flatten();
    Ok(date)
}
