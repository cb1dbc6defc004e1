//! Target-store loading: schema creation, surrogate-key assignment,
//! insertion, and post-load referential verification.

use crate::dimkeys::DimKeyCache;
use crate::error::EtlResult;
use crate::transform::TransformedTable;
use igh_core::{
    generate_create_table, CompiledMap, CompiledTable, ReferentialWarning, TableLoad, Value,
};
use igh_db::Database;

pub struct Loader<'a> {
    db: &'a dyn Database,
}

impl<'a> Loader<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Drop and recreate every target table, in load order.
    pub async fn create_schema(&self, map: &CompiledMap, order: &[String]) -> EtlResult<()> {
        for name in order {
            if let Some(table) = map.get(name) {
                self.db.drop_if_exists(name).await?;
                self.db.execute_batch(&generate_create_table(table)).await?;
            }
        }
        log::info!("created {} target tables", order.len());
        Ok(())
    }

    /// Insert one transformed table, assigning surrogate keys and
    /// registering natural keys for downstream FK resolution.
    ///
    /// Surrogate keys are dense and 1-based in insert order, so a rerun
    /// over the same source produces the same keys.
    pub async fn load_table(
        &self,
        table: &CompiledTable,
        transformed: &TransformedTable,
        dim_keys: &mut DimKeyCache,
    ) -> EtlResult<TableLoad> {
        let mut columns: Vec<String> = Vec::with_capacity(transformed.columns.len() + 1);
        if let Some(pk) = &table.spec.primary_key {
            columns.push(pk.clone());
        }
        columns.extend(transformed.columns.iter().cloned());

        let has_pk = table.spec.primary_key.is_some();
        let mut rows: Vec<Vec<Value>> = Vec::with_capacity(transformed.rows.len());
        for (i, row) in transformed.rows.iter().enumerate() {
            let surrogate = (i + 1) as i64;
            let mut values = Vec::with_capacity(columns.len());
            if has_pk {
                values.push(Value::Int(surrogate));
            }
            values.extend(row.iter().cloned());
            rows.push(values);

            let key = &transformed.natural_keys[i];
            if has_pk && !key.is_empty() {
                dim_keys.register(table.name(), key.clone(), surrogate);
            }
        }

        let inserted = self.db.insert_rows(table.name(), &columns, &rows).await?;
        log::info!(
            "loaded {}: {} rows ({} dropped)",
            table.name(),
            inserted,
            transformed.rows_dropped
        );
        Ok(TableLoad {
            name: table.name().to_string(),
            rows_inserted: inserted,
            rows_dropped: transformed.rows_dropped,
        })
    }

    /// Audit every FK column of every loaded table against its dimension:
    /// non-null key values with no matching dimension row are orphans.
    /// With fact misses nulled and bridge misses dropped at transform
    /// time, a non-empty result means the load itself is inconsistent.
    pub async fn verify_foreign_keys(
        &self,
        map: &CompiledMap,
        order: &[String],
    ) -> EtlResult<Vec<ReferentialWarning>> {
        let mut warnings = Vec::new();
        for name in order {
            let Some(table) = map.get(name) else { continue };
            for col in table.fk_columns() {
                let Some(dimension) = col.expr.referenced_dimension() else {
                    continue;
                };
                let Some(dim) = map.get(dimension) else { continue };
                let Some(dim_pk) = &dim.spec.primary_key else { continue };

                let sql = format!(
                    "SELECT * FROM {t} WHERE {c} IS NOT NULL \
                     AND NOT EXISTS (SELECT 1 FROM {d} WHERE {d}.{k} = {t}.{c})",
                    t = name,
                    c = col.name,
                    d = dimension,
                    k = dim_pk,
                );
                let orphans = self.db.query_count(&sql).await?;
                if orphans > 0 {
                    log::warn!(
                        "{}.{}: {} orphan references to {}",
                        name,
                        col.name,
                        orphans,
                        dimension
                    );
                    warnings.push(ReferentialWarning {
                        table: name.clone(),
                        column: col.name.clone(),
                        dimension: dimension.to_string(),
                        orphan_rows: orphans,
                    });
                }
            }
        }
        Ok(warnings)
    }
}
