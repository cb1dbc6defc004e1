//! Row-level expression evaluation.
//!
//! One [`EvalContext`] is built per pipeline run and shared by every
//! table transform. It never touches the database: optionsets, lookup
//! tables, and dimension keys are all resolved from in-memory caches.

use crate::dimkeys::DimKeyCache;
use crate::error::{EtlError, EtlResult};
use crate::optionset::OptionsetCatalog;
use igh_core::{CompiledColumn, Expr, FkSource, LookupRegistry, Value};
use igh_db::Row;

/// Outcome of evaluating one column expression against one source row.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Value(Value),
    /// A foreign-key source value was present but matched no row in the
    /// target dimension. Facts null these out; bridges drop the row.
    FkMiss { dimension: String },
}

pub struct EvalContext<'a> {
    pub optionsets: &'a OptionsetCatalog,
    pub dim_keys: &'a DimKeyCache,
    pub lookups: &'a LookupRegistry,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        optionsets: &'a OptionsetCatalog,
        dim_keys: &'a DimKeyCache,
        lookups: &'a LookupRegistry,
    ) -> Self {
        Self {
            optionsets,
            dim_keys,
            lookups,
        }
    }

    pub fn evaluate(&self, table: &str, column: &CompiledColumn, row: &Row) -> EtlResult<Resolved> {
        match &column.expr {
            Expr::Literal(v) => Ok(Resolved::Value(v.clone())),

            Expr::Column(name) => Ok(Resolved::Value(self.col(table, name, row)?.clone())),

            Expr::Coalesce { column: src, default } => {
                let value = match src {
                    Some(name) => self.col(table, name, row)?.clone(),
                    None => Value::Null,
                };
                if value.is_null() {
                    Ok(Resolved::Value(default.clone()))
                } else {
                    Ok(Resolved::Value(value))
                }
            }

            Expr::Case(case) => {
                let value = self.col(table, &case.column, row)?;
                // NULL never matches, even with a negated comparison.
                let matched = if value.is_null() {
                    false
                } else {
                    let equal = match &case.compare {
                        Value::Int(n) => value.to_int() == Some(*n),
                        other => value.to_string() == other.to_string(),
                    };
                    equal != case.negated
                };
                if matched {
                    Ok(Resolved::Value(case.then_value.clone()))
                } else {
                    Ok(Resolved::Value(case.else_value.clone()))
                }
            }

            Expr::Lookup(name) => {
                // Registration is checked at compile time.
                let lookup = self.lookups.get(name).ok_or_else(|| {
                    igh_core::CoreError::UnknownLookup {
                        name: name.clone(),
                        table: table.to_string(),
                        column: column.name.clone(),
                    }
                })?;
                let key = self.col(table, &lookup.key_column, row)?;
                Ok(Resolved::Value(Value::Int(lookup.get(&key.to_string()))))
            }

            Expr::Optionset { column: src } => {
                let value = self.col(table, src, row)?;
                if value.is_null() {
                    return Ok(Resolved::Value(Value::Null));
                }
                let code = value.to_int().ok_or_else(|| EtlError::BadOptionCode {
                    column: src.clone(),
                    value: value.to_string(),
                })?;
                let label = self.optionsets.label_for(src, code)?;
                Ok(Resolved::Value(Value::Text(label.to_string())))
            }

            Expr::Fk {
                dimension, source, ..
            } => {
                let raw = match source {
                    FkSource::Column(name) => self.col(table, name, row)?.clone(),
                    FkSource::DatePart(name) => extract_date(self.col(table, name, row)?),
                    // Delimited FKs are resolved by the bridge transform,
                    // one surrogate per split part.
                    FkSource::Delimited => Value::Null,
                };
                if raw.is_null() {
                    return Ok(Resolved::Value(Value::Null));
                }
                self.resolve_fk(dimension, vec![raw.key_part()])
            }

            Expr::FkComposite { dimension, columns } => {
                let mut parts = Vec::with_capacity(columns.len());
                for name in columns {
                    let value = self.col(table, name, row)?;
                    if value.is_null() {
                        // Incomplete composite key: null out, no gap recorded.
                        return Ok(Resolved::Value(Value::Null));
                    }
                    parts.push(value.key_part());
                }
                self.resolve_fk(dimension, parts)
            }

            // Filled in by the loader (surrogate keys) or by the
            // delimited-table transforms.
            Expr::Generated | Expr::Delimited => Ok(Resolved::Value(Value::Null)),
        }
    }

    /// Surrogate key for one dimension FK, given the already-built key tuple.
    pub fn resolve_fk(&self, dimension: &str, key: igh_core::KeyTuple) -> EtlResult<Resolved> {
        match self.dim_keys.lookup(dimension, &key) {
            Some(surrogate) => Ok(Resolved::Value(Value::Int(surrogate))),
            None => Ok(Resolved::FkMiss {
                dimension: dimension.to_string(),
            }),
        }
    }

    fn col<'r>(&self, table: &str, name: &str, row: &'r Row) -> EtlResult<&'r Value> {
        row.get(name).ok_or_else(|| EtlError::MissingSourceColumn {
            table: table.to_string(),
            column: name.to_string(),
        })
    }
}

/// First ten characters of a timestamp-ish text value (the ISO date part).
/// Non-text and null values yield null.
pub fn extract_date(value: &Value) -> Value {
    match value {
        Value::Text(s) if s.is_empty() => Value::Null,
        Value::Text(s) => match s.get(..10) {
            Some(date) => Value::Text(date.to_string()),
            None => Value::Text(s.clone()),
        },
        _ => Value::Null,
    }
}

#[cfg(test)]
#[path = "eval_test.rs"]
mod tests;
