//! Snapshot resolver
//!
//! Builds the "latest row per key" query for any domain table from a
//! [`TableSpec`]. For every row we keep it only if its timestamp equals the
//! maximum timestamp among rows sharing its key. Key columns are compared
//! with `IS`, so two NULLs match and NULL never matches a value.
//!
//! Rows tied on (key, max timestamp) are all returned. The optional equality
//! filter is applied to the outer query only, after the latest row per key
//! has been decided over the whole partition.

use crate::db::sqlite::models::Domain;
use crate::error::{AppError, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

/// Static description of a domain table
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub domain: Domain,
    pub table: &'static str,
    /// Selected columns, in row-mapping order
    pub columns: &'static [&'static str],
    pub key_columns: &'static [&'static str],
    pub timestamp_column: &'static str,
}

impl TableSpec {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    fn select_list(&self, alias: &str) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{}", alias, c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn order_by(&self, alias: &str) -> String {
        self.key_columns
            .iter()
            .map(|c| format!("{}.{}", alias, c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Equality filter on one column
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub column: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Filter on a text column
    pub fn text(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, Value::Text(value.into()))
    }
}

fn check_column(spec: &TableSpec, column: &str) -> Result<()> {
    if spec.has_column(column) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Unknown field '{}' for domain {}",
            column, spec.domain
        )))
    }
}

/// Build the snapshot SQL for `spec`, optionally narrowed by `filter_column`
pub fn build_snapshot_sql(spec: &TableSpec, filter_column: Option<&str>) -> Result<String> {
    let key_match = spec
        .key_columns
        .iter()
        .map(|c| format!("i.{c} IS o.{c}", c = c))
        .collect::<Vec<_>>()
        .join(" AND ");

    let mut sql = format!(
        "SELECT {select} FROM {table} o \
         WHERE o.{ts} = (SELECT MAX(i.{ts}) FROM {table} i WHERE {key_match})",
        select = spec.select_list("o"),
        table = spec.table,
        ts = spec.timestamp_column,
        key_match = key_match,
    );

    if let Some(column) = filter_column {
        check_column(spec, column)?;
        sql.push_str(&format!(" AND o.{} IS ?1", column));
    }

    sql.push_str(&format!(" ORDER BY {}, o.rowid", spec.order_by("o")));
    Ok(sql)
}

/// Run the snapshot query for `spec` and map rows with `map_row`
pub fn resolve<T, F>(
    conn: &Connection,
    spec: &TableSpec,
    filter: Option<&FieldFilter>,
    map_row: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = build_snapshot_sql(spec, filter.map(|f| f.column.as_str()))?;
    let mut stmt = conn.prepare(&sql)?;

    let params: Vec<Value> = filter.map(|f| vec![f.value.clone()]).unwrap_or_default();
    let rows = stmt
        .query_map(params_from_iter(params), map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Raw rows matching every equality term, without snapshot deduplication
pub fn query<T, F>(
    conn: &Connection,
    spec: &TableSpec,
    predicate: &[FieldFilter],
    map_row: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut sql = format!("SELECT {} FROM {} o", spec.select_list("o"), spec.table);

    if !predicate.is_empty() {
        let mut terms = Vec::with_capacity(predicate.len());
        for (i, term) in predicate.iter().enumerate() {
            check_column(spec, &term.column)?;
            terms.push(format!("o.{} IS ?{}", term.column, i + 1));
        }
        sql.push_str(" WHERE ");
        sql.push_str(&terms.join(" AND "));
    }
    sql.push_str(&format!(
        " ORDER BY {}, o.{}",
        spec.order_by("o"),
        spec.timestamp_column
    ));

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<Value> = predicate.iter().map(|t| t.value.clone()).collect();
    let rows = stmt
        .query_map(params_from_iter(params), map_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Newest timestamp in the table, if any rows exist
pub fn max_timestamp(conn: &Connection, spec: &TableSpec) -> Result<Option<String>> {
    let sql = format!(
        "SELECT MAX({}) FROM {}",
        spec.timestamp_column, spec.table
    );
    let latest: Option<String> = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(latest)
}
