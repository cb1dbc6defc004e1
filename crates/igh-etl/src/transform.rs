//! Row transforms: source rows (or nothing, for generated tables) in,
//! target-shaped rows out.
//!
//! Transforms are pure in-memory passes over extracted rows; nothing
//! here touches either database. The loader owns surrogate-key
//! assignment and insertion.

use crate::error::EtlResult;
use crate::eval::{EvalContext, Resolved};
use chrono::{Datelike, NaiveDate};
use igh_core::{
    delimited_fk_column, CompiledTable, Expr, KeyPart, KeyTuple, Special, TableKind, Value,
};
use igh_db::Row;
use std::collections::HashSet;

/// Unresolvable FK references observed for one fact column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FkGap {
    pub column: String,
    pub dimension: String,
    pub count: usize,
}

/// One table's worth of target-shaped rows, ready for the loader.
pub struct TransformedTable {
    /// Target column names, in spec order. The surrogate primary key is
    /// not among them.
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Natural-key tuple per row, parallel to `rows`. Empty tuples for
    /// tables nothing references.
    pub natural_keys: Vec<KeyTuple>,
    /// Fact FK values nulled out because the dimension had no match.
    pub gaps: Vec<FkGap>,
    /// Bridge rows dropped for the same reason.
    pub rows_dropped: usize,
}

pub struct Transformer<'a> {
    ctx: &'a EvalContext<'a>,
}

impl<'a> Transformer<'a> {
    pub fn new(ctx: &'a EvalContext<'a>) -> Self {
        Self { ctx }
    }

    /// Transform one table. `source_rows` is the extracted source (already
    /// concatenated across union sources); generated tables ignore it.
    pub fn transform(
        &self,
        table: &CompiledTable,
        source_rows: &[Row],
    ) -> EtlResult<TransformedTable> {
        match &table.spec.special {
            Some(Special::Generate {
                start_year,
                end_year,
            }) => self.generate_date_spine(table, *start_year, *end_year),
            Some(Special::Distinct { distinct_cols }) => {
                self.transform_distinct(table, distinct_cols, source_rows)
            }
            Some(Special::Delimited {
                source_column,
                delimiter,
            }) => self.transform_delimited_dimension(table, source_column, delimiter, source_rows),
            Some(Special::DelimitedBridge {
                source_column,
                delimiter,
            }) => self.transform_delimited_bridge(table, source_column, delimiter, source_rows),
            Some(Special::Union { .. }) | None => self.transform_rows(table, source_rows),
        }
    }

    /// The plain path: one target row per source row. Facts null out
    /// unresolved FKs and record the gap; bridges drop the row instead,
    /// so a bridge never carries a null side.
    fn transform_rows(&self, table: &CompiledTable, source_rows: &[Row]) -> EtlResult<TransformedTable> {
        let drop_unresolved = table.spec.kind() == TableKind::Bridge;
        let mut out = TransformedTable::empty(table);
        let mut gaps = GapCounter::new();

        'rows: for row in source_rows {
            let mut values = Vec::with_capacity(table.columns.len());
            for col in &table.columns {
                match self.ctx.evaluate(table.name(), col, row)? {
                    Resolved::Value(v) => values.push(v),
                    Resolved::FkMiss { dimension } => {
                        if drop_unresolved {
                            log::debug!(
                                "{}: dropping row, no {} match for {}",
                                table.name(),
                                dimension,
                                col.name
                            );
                            out.rows_dropped += 1;
                            continue 'rows;
                        }
                        gaps.count(&col.name, &dimension);
                        values.push(Value::Null);
                    }
                }
            }
            out.push_row(table, values);
        }

        out.gaps = gaps.into_gaps();
        Ok(out)
    }

    /// Distinct dimension: one row per distinct tuple of the raw
    /// `distinct_cols` projection, first occurrence wins. The raw tuple
    /// is the natural key, which is exactly what composite FK lookups
    /// build from fact rows.
    fn transform_distinct(
        &self,
        table: &CompiledTable,
        distinct_cols: &[String],
        source_rows: &[Row],
    ) -> EtlResult<TransformedTable> {
        let mut out = TransformedTable::empty(table);
        let mut seen: HashSet<KeyTuple> = HashSet::new();

        for row in source_rows {
            let mut tuple = Vec::with_capacity(distinct_cols.len());
            for name in distinct_cols {
                tuple.push(row.get(name).map_or(KeyPart::Null, |v| v.key_part()));
            }
            if tuple.iter().all(|p| *p == KeyPart::Null) || !seen.insert(tuple.clone()) {
                continue;
            }

            let mut values = Vec::with_capacity(table.columns.len());
            for col in &table.columns {
                match self.ctx.evaluate(table.name(), col, row)? {
                    Resolved::Value(v) => values.push(v),
                    Resolved::FkMiss { .. } => values.push(Value::Null),
                }
            }
            out.columns_push(values, tuple);
        }
        Ok(out)
    }

    /// The date spine: one row per calendar date across the configured
    /// years, columns filled by name.
    fn generate_date_spine(
        &self,
        table: &CompiledTable,
        start_year: i32,
        end_year: i32,
    ) -> EtlResult<TransformedTable> {
        let mut out = TransformedTable::empty(table);

        let first = NaiveDate::from_ymd_opt(start_year, 1, 1);
        let last = NaiveDate::from_ymd_opt(end_year, 12, 31);
        let (Some(first), Some(last)) = (first, last) else {
            return Ok(out);
        };

        let mut date = first;
        while date <= last {
            let values: Vec<Value> = table
                .columns
                .iter()
                .map(|col| match col.expr {
                    Expr::Generated => date_column(&col.name, date),
                    _ => Value::Null,
                })
                .collect();
            out.push_row(table, values);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(out)
    }

    /// Delimited dimension: split the configured field across every source
    /// row and emit one row per distinct trimmed part, sorted.
    fn transform_delimited_dimension(
        &self,
        table: &CompiledTable,
        source_column: &str,
        delimiter: &str,
        source_rows: &[Row],
    ) -> EtlResult<TransformedTable> {
        let mut parts: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for row in source_rows {
            for part in split_parts(row.get(source_column), delimiter) {
                if seen.insert(part.clone()) {
                    parts.push(part);
                }
            }
        }
        parts.sort();

        let mut out = TransformedTable::empty(table);
        let empty_row = Row::new();
        for part in parts {
            let mut values = Vec::with_capacity(table.columns.len());
            for col in &table.columns {
                let v = match &col.expr {
                    Expr::Delimited => Value::Text(part.clone()),
                    _ => match self.ctx.evaluate(table.name(), col, &empty_row)? {
                        Resolved::Value(v) => v,
                        Resolved::FkMiss { .. } => Value::Null,
                    },
                };
                values.push(v);
            }
            out.push_row(table, values);
        }
        Ok(out)
    }

    /// Delimited bridge: one row per (source row, delimited part) pair.
    /// Parts that resolve no dimension row are dropped, like any other
    /// unresolved bridge side.
    fn transform_delimited_bridge(
        &self,
        table: &CompiledTable,
        source_column: &str,
        delimiter: &str,
        source_rows: &[Row],
    ) -> EtlResult<TransformedTable> {
        let mut out = TransformedTable::empty(table);
        let part_fk = delimited_fk_column(table).map(|c| c.name.clone());

        'pairs: for row in source_rows {
            for part in split_parts(row.get(source_column), delimiter) {
                let mut values = Vec::with_capacity(table.columns.len());
                for col in &table.columns {
                    let resolved = if Some(&col.name) == part_fk.as_ref() {
                        match &col.expr {
                            Expr::Fk { dimension, .. } => self
                                .ctx
                                .resolve_fk(dimension, vec![KeyPart::Text(part.clone())])?,
                            _ => Resolved::Value(Value::Null),
                        }
                    } else {
                        self.ctx.evaluate(table.name(), col, row)?
                    };
                    match resolved {
                        Resolved::Value(v) => values.push(v),
                        Resolved::FkMiss { dimension } => {
                            log::debug!(
                                "{}: dropping pair, no {} match for '{}'",
                                table.name(),
                                dimension,
                                part
                            );
                            out.rows_dropped += 1;
                            continue 'pairs;
                        }
                    }
                }
                out.push_row(table, values);
            }
        }
        Ok(out)
    }
}

impl TransformedTable {
    fn empty(table: &CompiledTable) -> Self {
        Self {
            columns: table.columns.iter().map(|c| c.name.clone()).collect(),
            rows: Vec::new(),
            natural_keys: Vec::new(),
            gaps: Vec::new(),
            rows_dropped: 0,
        }
    }

    /// Append a row, deriving its natural key from the declared
    /// natural-key target columns.
    fn push_row(&mut self, table: &CompiledTable, values: Vec<Value>) {
        let key = table
            .spec
            .natural_key
            .iter()
            .filter_map(|name| self.columns.iter().position(|c| c == name))
            .map(|i| values[i].key_part())
            .collect();
        self.columns_push(values, key);
    }

    fn columns_push(&mut self, values: Vec<Value>, key: KeyTuple) {
        self.rows.push(values);
        self.natural_keys.push(key);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trimmed, non-empty parts of a delimited text value.
fn split_parts(value: Option<&Value>, delimiter: &str) -> Vec<String> {
    match value {
        Some(Value::Text(s)) => s
            .split(delimiter)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Date-spine column values, by target column name.
fn date_column(name: &str, date: NaiveDate) -> Value {
    match name {
        "full_date" => Value::Text(date.to_string()),
        "year" => Value::Int(date.year() as i64),
        "quarter" => Value::Int(((date.month() - 1) / 3 + 1) as i64),
        "month" => Value::Int(date.month() as i64),
        "day" => Value::Int(date.day() as i64),
        "day_of_week" => Value::Int(date.weekday().number_from_monday() as i64),
        _ => Value::Null,
    }
}

/// Accumulates FK misses per (column, dimension) in first-seen order.
struct GapCounter {
    gaps: Vec<FkGap>,
}

impl GapCounter {
    fn new() -> Self {
        Self { gaps: Vec::new() }
    }

    fn count(&mut self, column: &str, dimension: &str) {
        if let Some(gap) = self
            .gaps
            .iter_mut()
            .find(|g| g.column == column && g.dimension == dimension)
        {
            gap.count += 1;
            return;
        }
        self.gaps.push(FkGap {
            column: column.to_string(),
            dimension: dimension.to_string(),
            count: 1,
        });
    }

    fn into_gaps(self) -> Vec<FkGap> {
        self.gaps
    }
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod tests;
