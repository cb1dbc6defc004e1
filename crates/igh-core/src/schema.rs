//! Schema map model: the declarative description of the target star schema.
//!
//! The raw [`SchemaMap`] carries expressions as strings (exactly what a YAML
//! schema-map document deserializes to). [`CompiledMap::compile`] parses
//! every expression once and runs all static validation, so a malformed map
//! fails before any source row is read.

use crate::error::{CoreError, CoreResult};
use crate::expr::{self, Expr, FkSource};
use crate::lookup::LookupRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The full target-table mapping, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMap {
    pub tables: Vec<TableSpec>,
}

impl SchemaMap {
    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn from_yaml(text: &str) -> CoreResult<Self> {
        let map: SchemaMap = serde_yaml::from_str(text)?;
        Ok(map)
    }
}

/// Mapping for one target table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,

    /// Source table name; `None` for fully generated tables, the literal
    /// `"UNION"` for bridges sourced from `special.union_sources`.
    #[serde(default)]
    pub source_table: Option<String>,

    /// Surrogate primary key column, assigned at load time. Bridges may
    /// omit it.
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Target columns forming the natural key, used to register surrogate
    /// keys for FK resolution. Empty for tables nothing references.
    #[serde(default)]
    pub natural_key: Vec<String>,

    #[serde(default)]
    pub special: Option<Special>,

    /// Ordered column-to-expression mapping.
    pub columns: Vec<ColumnSpec>,
}

/// One target column and its mapping-expression string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub expr: String,
}

/// Special table-generation instructions; at most one applies per table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Special {
    /// Deduplicate the projection of `distinct_cols` (source columns);
    /// each distinct tuple becomes one dimension row.
    Distinct { distinct_cols: Vec<String> },
    /// Generate one row per date in `[start_year-01-01, end_year-12-31]`.
    Generate { start_year: i32, end_year: i32 },
    /// Concatenate rows transformed independently from each source table.
    Union { union_sources: Vec<String> },
    /// One dimension row per distinct trimmed part of a delimited field.
    Delimited {
        source_column: String,
        delimiter: String,
    },
    /// One bridge row per (entity, delimited part) pair.
    DelimitedBridge {
        source_column: String,
        delimiter: String,
    },
}

/// Where a table's rows come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind<'a> {
    Table(&'a str),
    Generated,
    Union,
}

/// Target-table role, by naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Dimension,
    Fact,
    Bridge,
}

impl TableSpec {
    pub fn source(&self) -> SourceKind<'_> {
        match self.source_table.as_deref() {
            None => SourceKind::Generated,
            Some("UNION") => SourceKind::Union,
            Some(t) => SourceKind::Table(t),
        }
    }

    pub fn kind(&self) -> TableKind {
        if self.name.starts_with("fact_") {
            TableKind::Fact
        } else if self.name.starts_with("bridge_") {
            TableKind::Bridge
        } else {
            TableKind::Dimension
        }
    }
}

/// One target column with its parsed expression.
#[derive(Debug, Clone)]
pub struct CompiledColumn {
    pub name: String,
    pub expr: Expr,
}

/// A table spec whose expressions have been parsed and validated.
#[derive(Debug, Clone)]
pub struct CompiledTable {
    pub spec: TableSpec,
    /// Parsed columns, in spec order. The primary key is not among them;
    /// it is assigned by the loader.
    pub columns: Vec<CompiledColumn>,
}

impl CompiledTable {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// FK expressions of this table as (column, expr) pairs.
    pub fn fk_columns(&self) -> impl Iterator<Item = &CompiledColumn> {
        self.columns.iter().filter(|c| c.expr.is_fk())
    }
}

/// The whole schema map, compiled and validated.
#[derive(Debug, Clone)]
pub struct CompiledMap {
    tables: Vec<CompiledTable>,
    index: HashMap<String, usize>,
}

impl CompiledMap {
    /// Parse every column expression and validate cross-table references.
    ///
    /// Errors here are configuration errors: the caller must not have
    /// touched the source store yet.
    pub fn compile(map: &SchemaMap, lookups: &LookupRegistry) -> CoreResult<Self> {
        let mut tables = Vec::with_capacity(map.tables.len());
        let mut index = HashMap::new();

        for spec in &map.tables {
            if index.contains_key(&spec.name) {
                return Err(CoreError::DuplicateTable {
                    name: spec.name.clone(),
                });
            }
            validate_spec(spec)?;

            let mut columns = Vec::with_capacity(spec.columns.len());
            for col in &spec.columns {
                let parsed = expr::parse(&col.expr)?;
                if let Expr::Lookup(name) = &parsed {
                    if !lookups.contains(name) {
                        return Err(CoreError::UnknownLookup {
                            name: name.clone(),
                            table: spec.name.clone(),
                            column: col.name.clone(),
                        });
                    }
                }
                columns.push(CompiledColumn {
                    name: col.name.clone(),
                    expr: parsed,
                });
            }

            index.insert(spec.name.clone(), tables.len());
            tables.push(CompiledTable {
                spec: spec.clone(),
                columns,
            });
        }

        let compiled = Self { tables, index };
        compiled.validate_fk_targets()?;
        Ok(compiled)
    }

    pub fn get(&self, name: &str) -> Option<&CompiledTable> {
        self.index.get(name).map(|&i| &self.tables[i])
    }

    pub fn tables(&self) -> impl Iterator<Item = &CompiledTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every FK must reference a mapped table, through its declared natural
    /// key; composite FKs must line up with the dimension's distinct columns.
    fn validate_fk_targets(&self) -> CoreResult<()> {
        for table in &self.tables {
            for col in table.fk_columns() {
                match &col.expr {
                    Expr::Fk {
                        dimension,
                        lookup_column,
                        ..
                    } => {
                        let dim = self.get(dimension).ok_or_else(|| {
                            CoreError::UnknownFkTarget {
                                table: table.spec.name.clone(),
                                column: col.name.clone(),
                                dimension: dimension.clone(),
                            }
                        })?;
                        if dim.spec.natural_key.len() != 1
                            || dim.spec.natural_key[0] != *lookup_column
                        {
                            return Err(CoreError::NaturalKeyMismatch {
                                table: table.spec.name.clone(),
                                column: col.name.clone(),
                                dimension: dimension.clone(),
                                expected: dim.spec.natural_key.join(","),
                            });
                        }
                    }
                    Expr::FkComposite { dimension, columns } => {
                        let dim = self.get(dimension).ok_or_else(|| {
                            CoreError::UnknownFkTarget {
                                table: table.spec.name.clone(),
                                column: col.name.clone(),
                                dimension: dimension.clone(),
                            }
                        })?;
                        let matches = matches!(
                            &dim.spec.special,
                            Some(Special::Distinct { distinct_cols }) if distinct_cols == columns
                        );
                        if !matches {
                            return Err(CoreError::CompositeKeyMismatch {
                                table: table.spec.name.clone(),
                                column: col.name.clone(),
                                dimension: dimension.clone(),
                            });
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Structural checks that don't need other tables.
fn validate_spec(spec: &TableSpec) -> CoreResult<()> {
    let invalid = |reason: &str| CoreError::InvalidTableSpec {
        table: spec.name.clone(),
        reason: reason.to_string(),
    };

    if spec.columns.is_empty() {
        return Err(invalid("no columns mapped"));
    }

    match (&spec.special, spec.source()) {
        (Some(Special::Generate { start_year, end_year }), source) => {
            if source != SourceKind::Generated {
                return Err(invalid("generated table must have source_table: null"));
            }
            if start_year > end_year {
                return Err(invalid("generate start_year is after end_year"));
            }
        }
        (None, SourceKind::Generated) => {
            return Err(invalid("source_table: null requires a generate special"));
        }
        (Some(Special::Union { union_sources }), source) => {
            if source != SourceKind::Union || union_sources.is_empty() {
                return Err(invalid("union bridge needs source_table UNION and sources"));
            }
        }
        (_, SourceKind::Union) => {
            return Err(invalid("source_table UNION requires a union special"));
        }
        (Some(Special::Distinct { distinct_cols }), _) => {
            if distinct_cols.is_empty() {
                return Err(invalid("distinct_cols is empty"));
            }
        }
        (Some(Special::Delimited { delimiter, .. }), _)
        | (Some(Special::DelimitedBridge { delimiter, .. }), _) => {
            if delimiter.is_empty() {
                return Err(invalid("delimiter is empty"));
            }
        }
        _ => {}
    }

    // The natural key must name mapped target columns.
    for key_col in &spec.natural_key {
        if !spec.columns.iter().any(|c| &c.name == key_col) {
            return Err(invalid(&format!(
                "natural key column '{}' is not a mapped column",
                key_col
            )));
        }
    }

    Ok(())
}

/// Helper for delimited bridges: the FK column resolved per delimited part.
pub fn delimited_fk_column(table: &CompiledTable) -> Option<&CompiledColumn> {
    table.columns.iter().find(|c| {
        matches!(
            &c.expr,
            Expr::Fk {
                source: FkSource::Delimited,
                ..
            }
        )
    })
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
