//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::Connection;
use igh_core::Value;
use std::path::Path;
use std::sync::Mutex;

/// Days between 0001-01-01 (CE) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing database read-only (source stores are never mutated)
    pub fn open_read_only(path: &Path) -> DbResult<Self> {
        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let conn = Connection::open_with_flags(path, config)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(sql)
            .map_err(|e| DbError::ExecutionError(e.to_string()))
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Row>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        let mut names: Option<Vec<String>> = None;
        while let Some(row) = rows.next()? {
            let stmt = row.as_ref();
            let names = names.get_or_insert_with(|| {
                stmt.column_names().iter().map(|n| n.to_string()).collect()
            });
            let mut map = Row::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                let cell = row.get_ref(i).map_err(|e| DbError::Internal(e.to_string()))?;
                map.insert(name.clone(), value_from_ref(name, cell)?);
            }
            out.push(map);
        }
        Ok(out)
    }

    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    fn table_names_sync(&self, like: &str) -> DbResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_name LIKE ? ESCAPE '\\' ORDER BY table_name",
        )?;
        let mut rows = stmt.query([like])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0).map_err(|e| DbError::Internal(e.to_string()))?;
            names.push(name);
        }
        Ok(names)
    }

    fn table_columns_sync(&self, table: &str) -> DbResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_name = ? ORDER BY ordinal_position",
        )?;
        let mut rows = stmt.query([table])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0).map_err(|e| DbError::Internal(e.to_string()))?;
            names.push(name);
        }
        if names.is_empty() {
            return Err(DbError::TableNotFound(table.to_string()));
        }
        Ok(names)
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                [name],
                |row| row.get(0),
            )
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count > 0)
    }

    fn insert_rows_sync(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> DbResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let conn = self.conn.lock().unwrap();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        for row in rows {
            stmt.execute(duckdb::params_from_iter(row.iter().map(db_value)))
                .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
        }
        Ok(rows.len())
    }
}

/// Convert an engine value to a bindable DuckDB value.
fn db_value(v: &Value) -> duckdb::types::Value {
    match v {
        Value::Null => duckdb::types::Value::Null,
        Value::Int(n) => duckdb::types::Value::BigInt(*n),
        Value::Real(f) => duckdb::types::Value::Double(*f),
        Value::Text(s) => duckdb::types::Value::Text(s.clone()),
    }
}

/// Convert one DuckDB cell to an engine value.
///
/// Dates and timestamps come back as ISO text, which is what the date-spine
/// natural key and `EXTRACT_DATE:` sources expect.
fn value_from_ref(column: &str, v: ValueRef<'_>) -> DbResult<Value> {
    Ok(match v {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Int(b as i64),
        ValueRef::TinyInt(n) => Value::Int(n as i64),
        ValueRef::SmallInt(n) => Value::Int(n as i64),
        ValueRef::Int(n) => Value::Int(n as i64),
        ValueRef::BigInt(n) => Value::Int(n),
        ValueRef::HugeInt(n) => Value::Int(n as i64),
        ValueRef::UTinyInt(n) => Value::Int(n as i64),
        ValueRef::USmallInt(n) => Value::Int(n as i64),
        ValueRef::UInt(n) => Value::Int(n as i64),
        ValueRef::UBigInt(n) => Value::Int(n as i64),
        ValueRef::Float(f) => Value::Real(f as f64),
        ValueRef::Double(f) => Value::Real(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => {
            match NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE) {
                Some(date) => Value::Text(date.to_string()),
                None => {
                    return Err(DbError::UnsupportedType {
                        column: column.to_string(),
                        detail: format!("out-of-range date ({} days)", days),
                    })
                }
            }
        }
        ValueRef::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            let secs = micros.div_euclid(1_000_000);
            let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
            match DateTime::from_timestamp(secs, nanos) {
                Some(ts) => Value::Text(ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
                None => {
                    return Err(DbError::UnsupportedType {
                        column: column.to_string(),
                        detail: "out-of-range timestamp".to_string(),
                    })
                }
            }
        }
        other => {
            return Err(DbError::UnsupportedType {
                column: column.to_string(),
                detail: format!("{:?}", other.data_type()),
            })
        }
    })
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn table_names(&self, like: &str) -> DbResult<Vec<String>> {
        self.table_names_sync(like)
    }

    async fn table_columns(&self, table: &str) -> DbResult<Vec<String>> {
        self.table_columns_sync(table)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> DbResult<usize> {
        self.insert_rows_sync(table, columns, rows)
    }

    async fn drop_if_exists(&self, name: &str) -> DbResult<()> {
        // Try dropping as view first, then as table
        let _ = self.execute_sync(&format!("DROP VIEW IF EXISTS {}", name));
        let _ = self.execute_sync(&format!("DROP TABLE IF EXISTS {}", name));
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}
