//! Optionset resolution.
//!
//! The source store carries one `_optionset_<column>` table per
//! option-valued column, each holding (code, label) pairs. The catalog
//! loads them all up front so transforms never hit the database for a
//! label.

use crate::error::{EtlError, EtlResult};
use crate::extractor::Extractor;
use igh_core::Value;
use std::collections::HashMap;

/// In-memory catalog of every optionset table in the source store,
/// keyed by full table name.
pub struct OptionsetCatalog {
    sets: HashMap<String, HashMap<i64, String>>,
}

impl OptionsetCatalog {
    /// Load every `_optionset_*` table. A code appearing twice in the
    /// same table with different labels is a corrupt source and fatal.
    pub async fn build(extractor: &Extractor<'_>) -> EtlResult<Self> {
        let mut sets = HashMap::new();
        for table in extractor.optionset_tables().await? {
            let mut entries: HashMap<i64, String> = HashMap::new();
            for row in extractor.optionset_rows(&table).await? {
                let code = match row.get("code") {
                    Some(v) => v.to_int().ok_or_else(|| EtlError::BadOptionCode {
                        column: table.clone(),
                        value: v.to_string(),
                    })?,
                    None => continue,
                };
                let label = match row.get("label") {
                    Some(Value::Text(s)) => s.clone(),
                    Some(v) => v.to_string(),
                    None => String::new(),
                };
                if let Some(existing) = entries.get(&code) {
                    if *existing != label {
                        return Err(EtlError::AmbiguousOptionset {
                            optionset: table,
                            code,
                            first: existing.clone(),
                            second: label,
                        });
                    }
                    continue;
                }
                entries.insert(code, label);
            }
            log::debug!("loaded optionset {} ({} codes)", table, entries.len());
            sets.insert(table, entries);
        }
        Ok(Self { sets })
    }

    #[cfg(test)]
    pub fn from_entries(sets: HashMap<String, HashMap<i64, String>>) -> Self {
        Self { sets }
    }

    /// Table name an `OPTIONSET:` column resolves through.
    pub fn table_for_column(column: &str) -> String {
        format!("_optionset_{}", column)
    }

    /// Label for one code of one option-valued column. Unknown codes
    /// mean the source and its optionsets are out of sync, which is
    /// fatal rather than silently mislabeled.
    pub fn label_for(&self, column: &str, code: i64) -> EtlResult<&str> {
        let table = Self::table_for_column(column);
        let set = self.sets.get(&table).ok_or_else(|| EtlError::MissingOptionset {
            column: column.to_string(),
            expected_table: table.clone(),
        })?;
        set.get(&code)
            .map(|s| s.as_str())
            .ok_or_else(|| EtlError::UnknownOptionCode {
                optionset: table,
                code,
            })
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OptionsetCatalog {
        let mut sets = HashMap::new();
        let mut status = HashMap::new();
        status.insert(1, "Approved".to_string());
        status.insert(2, "Pending".to_string());
        sets.insert("_optionset_vin_ctstatus".to_string(), status);
        OptionsetCatalog::from_entries(sets)
    }

    #[test]
    fn test_label_for_known_code() {
        let cat = catalog();
        assert_eq!(cat.label_for("vin_ctstatus", 1).unwrap(), "Approved");
        assert_eq!(cat.label_for("vin_ctstatus", 2).unwrap(), "Pending");
    }

    #[test]
    fn test_unknown_code_is_fatal() {
        let cat = catalog();
        let err = cat.label_for("vin_ctstatus", 3).unwrap_err();
        assert!(matches!(err, EtlError::UnknownOptionCode { code: 3, .. }));
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let cat = catalog();
        let err = cat.label_for("vin_other", 1).unwrap_err();
        assert!(matches!(err, EtlError::MissingOptionset { .. }));
    }

    #[test]
    fn test_table_for_column() {
        assert_eq!(
            OptionsetCatalog::table_for_column("vin_ctstatus"),
            "_optionset_vin_ctstatus"
        );
    }
}
