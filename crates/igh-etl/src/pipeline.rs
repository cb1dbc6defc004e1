//! End-to-end pipeline: compile, validate, extract, transform, load,
//! verify.

use crate::dimkeys::DimKeyCache;
use crate::error::{EtlError, EtlResult};
use crate::eval::EvalContext;
use crate::extractor::Extractor;
use crate::loader::Loader;
use crate::optionset::OptionsetCatalog;
use crate::transform::Transformer;
use igh_core::{
    CompiledMap, LookupRegistry, ReferentialWarning, RunReport, SchemaMap, SourceKind, Special,
    TableDag,
};
use igh_db::{Database, Row};
use std::collections::HashSet;

pub struct Pipeline<'a> {
    source: &'a dyn Database,
    target: &'a dyn Database,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn Database, target: &'a dyn Database) -> Self {
        Self { source, target }
    }

    /// Run the whole transform-and-load. All configuration errors (bad
    /// expressions, cyclic FKs, a load order that violates dependencies)
    /// surface before the first source row is read.
    pub async fn run(
        &self,
        map: &SchemaMap,
        load_order: &[String],
        lookups: &LookupRegistry,
    ) -> EtlResult<RunReport> {
        let compiled = CompiledMap::compile(map, lookups)?;
        let dag = TableDag::from_map(&compiled)?;
        dag.validate()?;
        dag.validate_order(load_order)?;

        let extractor = Extractor::new(self.source);
        let optionsets = OptionsetCatalog::build(&extractor).await?;
        log::info!(
            "compiled {} tables, {} optionsets loaded",
            compiled.len(),
            optionsets.len()
        );

        let loader = Loader::new(self.target);
        loader.create_schema(&compiled, load_order).await?;

        let mut report = RunReport::new();
        let mut dim_keys = DimKeyCache::new();
        let mut inserted: HashSet<&str> = HashSet::new();

        for name in load_order {
            let Some(table) = compiled.get(name) else { continue };

            // validate_order already proved this holds; a failure here
            // means the DAG and the order disagree about this map.
            for dependency in dag.dependencies(name) {
                if !inserted.contains(dependency.as_str()) {
                    return Err(EtlError::DependencyNotInserted {
                        table: name.clone(),
                        dependency,
                    });
                }
            }

            let rows = self.fetch_source_rows(&extractor, table).await?;
            let transformed = {
                let ctx = EvalContext::new(&optionsets, &dim_keys, lookups);
                Transformer::new(&ctx).transform(table, &rows)?
            };

            for gap in &transformed.gaps {
                report.referential_warnings.push(ReferentialWarning {
                    table: name.clone(),
                    column: gap.column.clone(),
                    dimension: gap.dimension.clone(),
                    orphan_rows: gap.count,
                });
            }

            let load = loader.load_table(table, &transformed, &mut dim_keys).await?;
            report.tables.push(load);
            inserted.insert(name.as_str());
        }

        report
            .referential_warnings
            .extend(loader.verify_foreign_keys(&compiled, load_order).await?);
        Ok(report)
    }

    async fn fetch_source_rows(
        &self,
        extractor: &Extractor<'_>,
        table: &igh_core::CompiledTable,
    ) -> EtlResult<Vec<Row>> {
        match table.spec.source() {
            SourceKind::Generated => Ok(Vec::new()),
            SourceKind::Table(source) => extractor.rows(source).await,
            SourceKind::Union => {
                let Some(Special::Union { union_sources }) = &table.spec.special else {
                    return Ok(Vec::new());
                };
                let mut rows = Vec::new();
                for source in union_sources {
                    rows.extend(extractor.rows(source).await?);
                }
                Ok(rows)
            }
        }
    }
}
