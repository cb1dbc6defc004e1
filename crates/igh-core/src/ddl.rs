//! DDL generation for the target star schema.
//!
//! Column types are inferred from a fixed naming convention first, then from
//! the parsed expression kind; ambiguous cases default to text. Generation
//! is pure over a compiled table spec, so the same spec always yields
//! byte-identical DDL.

use crate::expr::Expr;
use crate::schema::{CompiledMap, CompiledTable};
use crate::value::Value;

/// Column-name suffixes that always mean an integer column.
const INTEGER_SUFFIXES: [&str; 4] = ["_key", "_id", "_flag", "_count"];

/// Exact column names that always mean an integer column.
const INTEGER_EXACT: [&str; 7] = [
    "sort_order",
    "year",
    "quarter",
    "month",
    "day",
    "day_of_week",
    "enrollment_count",
];

/// SQL column type for the target store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::Real => "DOUBLE",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Infer the SQL type of one target column from its name and expression.
pub fn infer_column_type(name: &str, expr: &Expr) -> ColumnType {
    let lower = name.to_ascii_lowercase();
    if INTEGER_SUFFIXES.iter().any(|s| lower.ends_with(s))
        || INTEGER_EXACT.contains(&lower.as_str())
    {
        return ColumnType::Integer;
    }

    match expr {
        Expr::Fk { .. } | Expr::FkComposite { .. } => ColumnType::Integer,
        // Lookup tables hold integer constants (sort orders).
        Expr::Lookup(_) => ColumnType::Integer,
        Expr::Literal(v) | Expr::Coalesce { default: v, .. } => value_type(v),
        Expr::Case(case) => {
            match (value_type(&case.then_value), value_type(&case.else_value)) {
                (ColumnType::Integer, ColumnType::Integer) => ColumnType::Integer,
                (ColumnType::Real, ColumnType::Real) => ColumnType::Real,
                _ => ColumnType::Text,
            }
        }
        _ => ColumnType::Text,
    }
}

fn value_type(v: &Value) -> ColumnType {
    match v {
        Value::Int(_) => ColumnType::Integer,
        Value::Real(_) => ColumnType::Real,
        _ => ColumnType::Text,
    }
}

/// Generate the `CREATE TABLE` statement for one target table.
///
/// The surrogate primary key comes first when the table declares one;
/// bridges without a primary key get only their mapped columns.
pub fn generate_create_table(table: &CompiledTable) -> String {
    let mut col_defs = Vec::with_capacity(table.columns.len() + 1);

    if let Some(pk) = &table.spec.primary_key {
        col_defs.push(format!("{} BIGINT PRIMARY KEY", pk));
    }

    for col in &table.columns {
        if Some(&col.name) == table.spec.primary_key.as_ref() {
            continue;
        }
        let col_type = infer_column_type(&col.name, &col.expr);
        col_defs.push(format!("{} {}", col.name, col_type.as_sql()));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        table.spec.name,
        col_defs.join(",\n    ")
    )
}

/// Generate all `CREATE TABLE` statements in load order.
pub fn generate_all_ddl(map: &CompiledMap, order: &[String]) -> Vec<String> {
    let mut statements = Vec::with_capacity(order.len());
    for name in order {
        if let Some(table) = map.get(name) {
            statements.push(generate_create_table(table));
            log::debug!("Generated DDL for {}", name);
        } else {
            log::warn!("Table {} in load order but not in schema map", name);
        }
    }
    log::info!("Generated {} CREATE TABLE statements", statements.len());
    statements
}

#[cfg(test)]
#[path = "ddl_test.rs"]
mod tests;
