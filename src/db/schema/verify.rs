use rusqlite::Connection;

use super::tables::Table;
use crate::db::{DbError, Result};

struct LiveColumn {
    name: String,
    sql_type: String,
    pk: i64,
}

fn live_columns(conn: &Connection, schema: &str, table: &str) -> Result<Vec<LiveColumn>> {
    let mut stmt = conn.prepare(&format!("PRAGMA {schema}.table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(LiveColumn {
                name: row.get(1)?,
                sql_type: row.get(2)?,
                pk: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn live_indices(conn: &Connection, schema: &str, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA {schema}.index_list({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Compare a live table against its expected layout. The first difference
/// found is reported as a [`DbError::SchemaMismatch`].
pub(crate) fn verify_table(conn: &Connection, schema: &str, expected: &Table) -> Result<()> {
    let table = expected.name;
    let live = live_columns(conn, schema, table)?;
    if live.is_empty() {
        return Err(DbError::SchemaMismatch(format!("table {table} is missing")));
    }

    for column in &expected.columns {
        let Some(found) = live.iter().find(|c| c.name == column.name) else {
            return Err(DbError::SchemaMismatch(format!(
                "column {table}.{} is missing",
                column.name
            )));
        };
        if !found.sql_type.eq_ignore_ascii_case(column.sql_type) {
            return Err(DbError::SchemaMismatch(format!(
                "column {table}.{} has type {}, expected {}",
                column.name, found.sql_type, column.sql_type
            )));
        }
        let pk = expected.pk_position(column);
        if found.pk != pk {
            return Err(DbError::SchemaMismatch(format!(
                "column {table}.{} has primary key position {}, expected {pk}",
                column.name, found.pk
            )));
        }
    }
    if let Some(extra) = live
        .iter()
        .find(|c| !expected.columns.iter().any(|e| e.name == c.name))
    {
        return Err(DbError::SchemaMismatch(format!(
            "unexpected column {table}.{}",
            extra.name
        )));
    }

    let indices = live_indices(conn, schema, table)?;
    for index in &expected.indices {
        if !indices.iter().any(|name| name == index.name) {
            return Err(DbError::SchemaMismatch(format!(
                "index {} on {table} is missing",
                index.name
            )));
        }
    }
    if let Some(extra) = indices.iter().find(|name| {
        !name.starts_with("sqlite_autoindex_") && !expected.indices.iter().any(|i| i.name == *name)
    }) {
        return Err(DbError::SchemaMismatch(format!(
            "unexpected index {extra} on {table}"
        )));
    }

    Ok(())
}

pub(crate) fn verify_tables(conn: &Connection, schema: &str, tables: &[Table]) -> Result<()> {
    for table in tables {
        verify_table(conn, schema, table)?;
    }
    Ok(())
}

/// Create `tables` in `schema`. Fails if any of them already exists.
pub(crate) fn create_tables(conn: &Connection, schema: &str, tables: &[Table]) -> Result<()> {
    let sql: String = tables.iter().map(|t| t.ddl(schema)).collect();
    conn.execute_batch(&sql)?;
    Ok(())
}
