//! Market quotes

use super::models::{Domain, MarketQuote};
use super::snapshot::{self, FieldFilter, TableSpec};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

pub const SPEC: TableSpec = TableSpec {
    domain: Domain::Markets,
    table: "market_quotes",
    columns: &["symbol", "category", "name", "value", "timestamp"],
    key_columns: &["symbol"],
    timestamp_column: "timestamp",
};

pub fn from_row(row: &Row<'_>) -> rusqlite::Result<MarketQuote> {
    Ok(MarketQuote {
        symbol: row.get(0)?,
        category: row.get(1)?,
        name: row.get(2)?,
        value: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

/// Append one quote
pub fn insert(conn: &Connection, quote: &MarketQuote) -> Result<()> {
    conn.execute(
        "INSERT INTO market_quotes (symbol, category, name, value, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![quote.symbol, quote.category, quote.name, quote.value, quote.timestamp],
    )?;
    Ok(())
}

/// Latest quote per symbol
pub fn snapshot(conn: &Connection, filter: Option<&FieldFilter>) -> Result<Vec<MarketQuote>> {
    snapshot::resolve(conn, &SPEC, filter, from_row)
}
