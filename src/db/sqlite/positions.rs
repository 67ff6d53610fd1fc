//! Portfolio positions
//!
//! Unlike the other domains, positions are upserted by id: a second write
//! for the same id replaces the payload and timestamp in place.

use super::models::{Domain, Position};
use super::snapshot::{self, FieldFilter, TableSpec};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

pub const SPEC: TableSpec = TableSpec {
    domain: Domain::Positions,
    table: "positions",
    columns: &[
        "id",
        "name",
        "asset_class",
        "market_value",
        "ytd_value",
        "ytd_pct",
        "irr",
        "tvpi",
        "nav_pct",
        "nav_target",
        "bucket",
        "timestamp",
    ],
    key_columns: &["id"],
    timestamp_column: "timestamp",
};

pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Position> {
    Ok(Position {
        id: row.get(0)?,
        name: row.get(1)?,
        asset_class: row.get(2)?,
        market_value: row.get(3)?,
        ytd_value: row.get(4)?,
        ytd_pct: row.get(5)?,
        irr: row.get(6)?,
        tvpi: row.get(7)?,
        nav_pct: row.get(8)?,
        nav_target: row.get(9)?,
        bucket: row.get(10)?,
        timestamp: row.get(11)?,
    })
}

/// Insert or replace the position with this id
pub fn upsert(conn: &Connection, position: &Position) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO positions (
            id, name, asset_class, market_value, ytd_value, ytd_pct,
            irr, tvpi, nav_pct, nav_target, bucket, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            asset_class = excluded.asset_class,
            market_value = excluded.market_value,
            ytd_value = excluded.ytd_value,
            ytd_pct = excluded.ytd_pct,
            irr = excluded.irr,
            tvpi = excluded.tvpi,
            nav_pct = excluded.nav_pct,
            nav_target = excluded.nav_target,
            bucket = excluded.bucket,
            timestamp = excluded.timestamp
        "#,
        params![
            position.id,
            position.name,
            position.asset_class,
            position.market_value,
            position.ytd_value,
            position.ytd_pct,
            position.irr,
            position.tvpi,
            position.nav_pct,
            position.nav_target,
            position.bucket,
            position.timestamp,
        ],
    )?;
    Ok(())
}

/// Current positions, one per id
pub fn snapshot(conn: &Connection, filter: Option<&FieldFilter>) -> Result<Vec<Position>> {
    snapshot::resolve(conn, &SPEC, filter, from_row)
}
