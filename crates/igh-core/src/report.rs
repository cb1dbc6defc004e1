//! Run report: the engine's sole external output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique identifier for this run
    pub run_id: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Per-table load results, in load order
    pub tables: Vec<TableLoad>,

    /// Referential-integrity warnings; empty for a clean run
    pub referential_warnings: Vec<ReferentialWarning>,
}

/// Load result for one target table.
#[derive(Debug, Clone, Serialize)]
pub struct TableLoad {
    pub name: String,
    pub rows_inserted: usize,
    /// Rows visibly dropped because a bridge FK could not resolve.
    pub rows_dropped: usize,
}

/// One FK column with dangling references.
#[derive(Debug, Clone, Serialize)]
pub struct ReferentialWarning {
    pub table: String,
    pub column: String,
    pub dimension: String,
    pub orphan_rows: usize,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            started_at: Utc::now(),
            tables: Vec::new(),
            referential_warnings: Vec::new(),
        }
    }

    /// Whether the run produced no dangling references.
    pub fn is_clean(&self) -> bool {
        self.referential_warnings.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows_inserted).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
