//! Economic releases

use super::models::{Domain, EconomicRelease};
use super::snapshot::{self, FieldFilter, TableSpec};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

pub const SPEC: TableSpec = TableSpec {
    domain: Domain::Economics,
    table: "economic_releases",
    columns: &[
        "indicator",
        "country",
        "value",
        "release_date",
        "period",
        "surprise",
        "timestamp",
    ],
    key_columns: &["indicator", "country"],
    timestamp_column: "timestamp",
};

pub fn from_row(row: &Row<'_>) -> rusqlite::Result<EconomicRelease> {
    Ok(EconomicRelease {
        indicator: row.get(0)?,
        country: row.get(1)?,
        value: row.get(2)?,
        release_date: row.get(3)?,
        period: row.get(4)?,
        surprise: row.get(5)?,
        timestamp: row.get(6)?,
    })
}

/// Append one release. An absent surprise is stored as NULL, never zero.
pub fn insert(conn: &Connection, release: &EconomicRelease) -> Result<()> {
    conn.execute(
        "INSERT INTO economic_releases
            (indicator, country, value, release_date, period, surprise, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            release.indicator,
            release.country,
            release.value,
            release.release_date,
            release.period,
            release.surprise,
            release.timestamp,
        ],
    )?;
    Ok(())
}

/// Latest release per (indicator, country)
pub fn snapshot(conn: &Connection, filter: Option<&FieldFilter>) -> Result<Vec<EconomicRelease>> {
    snapshot::resolve(conn, &SPEC, filter, from_row)
}
