//! Source-store extraction.

use crate::error::EtlResult;
use igh_db::{Database, Row};

/// LIKE pattern matching `_optionset_<column>` tables, with the
/// underscores escaped so they are not treated as wildcards.
const OPTIONSET_PATTERN: &str = "\\_optionset\\_%";

/// Reads rows and optionset tables out of the normalized source store.
pub struct Extractor<'a> {
    db: &'a dyn Database,
}

impl<'a> Extractor<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// All rows of a source table, in storage order.
    pub async fn rows(&self, table: &str) -> EtlResult<Vec<Row>> {
        let rows = self.db.query_rows(&format!("SELECT * FROM {}", table)).await?;
        log::debug!("extracted {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    /// Names of every `_optionset_*` table in the source store.
    pub async fn optionset_tables(&self) -> EtlResult<Vec<String>> {
        Ok(self.db.table_names(OPTIONSET_PATTERN).await?)
    }

    /// (code, label) pairs from one optionset table.
    pub async fn optionset_rows(&self, table: &str) -> EtlResult<Vec<Row>> {
        Ok(self
            .db
            .query_rows(&format!("SELECT code, label FROM {}", table))
            .await?)
    }
}
