//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use igh_core::Value;
use std::collections::HashMap;

/// One extracted row: column name to cell value.
pub type Row = HashMap<String, Value>;

/// Database abstraction trait for the transform engine.
///
/// Implementations must be Send + Sync for async operation. All engine I/O
/// is synchronous and blocking underneath; the async surface exists so the
/// CLI and pipeline share one runtime.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a SELECT and return all rows as column->value maps
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Names of tables matching a LIKE pattern (`\` escapes wildcards)
    async fn table_names(&self, like: &str) -> DbResult<Vec<String>>;

    /// Ordered column names of a table
    async fn table_columns(&self, table: &str) -> DbResult<Vec<String>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Insert rows through one prepared statement; returns rows written
    async fn insert_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<Value>],
    ) -> DbResult<usize>;

    /// Drop a table or view if it exists
    async fn drop_if_exists(&self, name: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
