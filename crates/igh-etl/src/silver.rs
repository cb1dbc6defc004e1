//! Bronze-to-silver promotion: copy every table of the raw bronze
//! store into a silver store, scrubbed and deduplicated but still in
//! source shape. The star-schema transform reads the silver store.

use crate::cleanup::TableData;
use crate::error::EtlResult;
use igh_core::{TableLoad, Value};
use igh_db::Database;

/// Per-table cleanup instructions; tables without a spec only get the
/// default whitespace scrub and empty-column drop.
#[derive(Debug, Clone, Default)]
pub struct CleanupSpec {
    pub table: String,
    pub drop_columns: Vec<String>,
    pub renames: Vec<(String, String)>,
    /// (column, from, to) exact-match replacements.
    pub replacements: Vec<(String, String, String)>,
    /// Keep the first row per value of this column.
    pub dedupe_key: Option<String>,
    /// Columns kept even when entirely null.
    pub preserve_columns: Vec<String>,
}

/// Cleanup specs for the known Dataverse entities.
pub fn builtin_cleanup_specs() -> Vec<CleanupSpec> {
    vec![
        CleanupSpec {
            table: "vin_candidates".to_string(),
            drop_columns: vec![
                "versionnumber".to_string(),
                "timezoneruleversionnumber".to_string(),
                "importsequencenumber".to_string(),
            ],
            replacements: vec![(
                "new_platform".to_string(),
                "N/A".to_string(),
                "Unknown".to_string(),
            )],
            dedupe_key: Some("vin_candidateid".to_string()),
            // The delimited developer field must survive even if empty
            // in a snapshot, downstream tables are built from it.
            preserve_columns: vec!["vin_developersaggregated".to_string()],
            ..Default::default()
        },
        CleanupSpec {
            table: "vin_clinicaltrials".to_string(),
            drop_columns: vec!["versionnumber".to_string()],
            dedupe_key: Some("vin_clinicaltrialid".to_string()),
            ..Default::default()
        },
        CleanupSpec {
            table: "accounts".to_string(),
            drop_columns: vec!["versionnumber".to_string()],
            dedupe_key: Some("accountid".to_string()),
            ..Default::default()
        },
    ]
}

/// Copy every bronze table into the silver store, cleaned.
pub async fn bronze_to_silver(
    bronze: &dyn Database,
    silver: &dyn Database,
    specs: &[CleanupSpec],
) -> EtlResult<Vec<TableLoad>> {
    let mut loads = Vec::new();
    for table in bronze.table_names("%").await? {
        let columns = bronze.table_columns(&table).await?;
        let raw = bronze
            .query_rows(&format!("SELECT * FROM {}", table))
            .await?;
        let row_count = raw.len();

        let rows: Vec<Vec<Value>> = raw
            .into_iter()
            .map(|mut r| {
                columns
                    .iter()
                    .map(|c| r.remove(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        let mut data = TableData::new(columns, rows);

        data.normalize_whitespace();
        let spec = specs.iter().find(|s| s.table == table);
        if let Some(spec) = spec {
            data.drop_columns_by_name(&spec.drop_columns);
            data.rename_columns(&spec.renames);
            for (column, from, to) in &spec.replacements {
                data.replace_values(column, from, to);
            }
            if let Some(key) = &spec.dedupe_key {
                data.dedupe_by(key);
            }
        }
        data.drop_empty_columns(spec.map_or(&[], |s| s.preserve_columns.as_slice()));

        write_table(silver, &table, &data).await?;
        log::info!(
            "promoted {}: {} rows ({} deduplicated)",
            table,
            data.rows.len(),
            row_count - data.rows.len()
        );
        loads.push(TableLoad {
            name: table,
            rows_inserted: data.rows.len(),
            rows_dropped: row_count - data.rows.len(),
        });
    }
    Ok(loads)
}

async fn write_table(silver: &dyn Database, table: &str, data: &TableData) -> EtlResult<()> {
    let defs: Vec<String> = data
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{} {}", name, probe_type(&data.rows, i)))
        .collect();

    silver.drop_if_exists(table).await?;
    silver
        .execute_batch(&format!(
            "CREATE TABLE {} (\n    {}\n);",
            table,
            defs.join(",\n    ")
        ))
        .await?;
    silver.insert_rows(table, &data.columns, &data.rows).await?;
    Ok(())
}

/// Narrowest SQL type holding every non-null value of one column.
fn probe_type(rows: &[Vec<Value>], index: usize) -> &'static str {
    let mut all_int = true;
    let mut all_numeric = true;
    let mut any = false;
    for row in rows {
        match &row[index] {
            Value::Null => {}
            Value::Int(_) => any = true,
            Value::Real(_) => {
                any = true;
                all_int = false;
            }
            Value::Text(_) => {
                any = true;
                all_int = false;
                all_numeric = false;
            }
        }
    }
    if !any {
        "TEXT"
    } else if all_int {
        "BIGINT"
    } else if all_numeric {
        "DOUBLE"
    } else {
        "TEXT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igh_db::DuckDbBackend;

    #[tokio::test]
    async fn test_bronze_to_silver_scrubs_and_dedupes() {
        let bronze = DuckDbBackend::in_memory().unwrap();
        bronze
            .execute_batch(
                "CREATE TABLE vin_clinicaltrials (vin_clinicaltrialid TEXT, vin_name TEXT, versionnumber BIGINT, junk TEXT); \
                 INSERT INTO vin_clinicaltrials VALUES ('t-1', '  Trial <br> One ', 5, NULL); \
                 INSERT INTO vin_clinicaltrials VALUES ('t-1', 'Trial One dup', 6, NULL); \
                 INSERT INTO vin_clinicaltrials VALUES ('t-2', '   ', 7, NULL);",
            )
            .await
            .unwrap();
        let silver = DuckDbBackend::in_memory().unwrap();

        let loads = bronze_to_silver(&bronze, &silver, &builtin_cleanup_specs())
            .await
            .unwrap();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].rows_inserted, 2);
        assert_eq!(loads[0].rows_dropped, 1);

        // versionnumber dropped by spec, junk dropped as all-null.
        let cols = silver.table_columns("vin_clinicaltrials").await.unwrap();
        assert_eq!(
            cols,
            vec!["vin_clinicaltrialid".to_string(), "vin_name".to_string()]
        );

        let rows = silver
            .query_rows("SELECT * FROM vin_clinicaltrials ORDER BY vin_clinicaltrialid")
            .await
            .unwrap();
        assert_eq!(rows[0]["vin_name"], Value::Text("Trial One".to_string()));
        assert_eq!(rows[1]["vin_name"], Value::Null);
    }

    #[test]
    fn test_probe_type() {
        let rows = vec![
            vec![Value::Int(1), Value::Real(1.5), Value::Null],
            vec![Value::Null, Value::Int(2), Value::Null],
        ];
        assert_eq!(probe_type(&rows, 0), "BIGINT");
        assert_eq!(probe_type(&rows, 1), "DOUBLE");
        assert_eq!(probe_type(&rows, 2), "TEXT");
    }
}
