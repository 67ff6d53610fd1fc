//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    run_migration(conn, "001_market_quotes", CREATE_MARKET_QUOTES_TABLE)?;
    run_migration(conn, "002_economic_releases", CREATE_ECONOMIC_RELEASES_TABLE)?;
    run_migration(conn, "003_pe_metrics", CREATE_PE_METRICS_TABLE)?;
    run_migration(conn, "004_positions", CREATE_POSITIONS_TABLE)?;
    run_migration(conn, "005_risk_measures", CREATE_RISK_MEASURES_TABLE)?;

    tracing::debug!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_MARKET_QUOTES_TABLE: &str = r#"
CREATE TABLE market_quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    symbol TEXT NOT NULL,
    category TEXT NOT NULL,
    name TEXT NOT NULL,
    value REAL NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_market_quotes_key_ts ON market_quotes(symbol, timestamp);
"#;

const CREATE_ECONOMIC_RELEASES_TABLE: &str = r#"
CREATE TABLE economic_releases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    indicator TEXT NOT NULL,
    country TEXT NOT NULL,
    value REAL NOT NULL,
    release_date TEXT NOT NULL,
    period TEXT NOT NULL,
    surprise REAL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_economic_releases_key_ts
    ON economic_releases(indicator, country, timestamp);
"#;

/// region is nullable; snapshot matching uses `IS` so NULL equals NULL
const CREATE_PE_METRICS_TABLE: &str = r#"
CREATE TABLE pe_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    metric TEXT NOT NULL,
    strategy TEXT NOT NULL,
    region TEXT,
    value REAL NOT NULL,
    period TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pe_metrics_key_ts ON pe_metrics(metric, strategy, region, timestamp);
"#;

const CREATE_POSITIONS_TABLE: &str = r#"
CREATE TABLE positions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    asset_class TEXT NOT NULL,
    market_value REAL NOT NULL,
    ytd_value REAL,
    ytd_pct REAL,
    irr REAL,
    tvpi REAL,
    nav_pct REAL,
    nav_target REAL,
    bucket TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_positions_bucket ON positions(bucket);
"#;

const CREATE_RISK_MEASURES_TABLE: &str = r#"
CREATE TABLE risk_measures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    as_of_date TEXT NOT NULL,
    bucket TEXT NOT NULL,
    var_99 REAL NOT NULL,
    stress_pl REAL NOT NULL,
    scenario TEXT NOT NULL,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_risk_measures_key_ts ON risk_measures(as_of_date, bucket, timestamp);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 5);
    }
}
