//! In-memory cell-level cleanup passes used by the bronze-to-silver
//! promotion.

use igh_core::Value;

/// One table's rows held as columns + value matrix, the unit every
/// cleanup pass operates on.
#[derive(Debug, Clone)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableData {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Drop the named columns, ignoring names that are not present.
    pub fn drop_columns_by_name(&mut self, names: &[String]) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();
        self.project(&keep);
    }

    /// Drop columns whose every value is null, except those in `preserve`.
    pub fn drop_empty_columns(&mut self, preserve: &[String]) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| {
                preserve.contains(&self.columns[i])
                    || self.rows.iter().any(|r| !r[i].is_null())
            })
            .collect();
        self.project(&keep);
    }

    pub fn rename_columns(&mut self, renames: &[(String, String)]) {
        for col in &mut self.columns {
            if let Some((_, to)) = renames.iter().find(|(from, _)| from == col) {
                *col = to.clone();
            }
        }
    }

    /// Scrub every text cell: drop `<br>` markup and non-breaking
    /// spaces, collapse runs of whitespace, and turn whitespace-only
    /// values into nulls.
    pub fn normalize_whitespace(&mut self) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if let Value::Text(s) = cell {
                    let cleaned = normalize_text(s);
                    *cell = match cleaned {
                        Some(text) => Value::Text(text),
                        None => Value::Null,
                    };
                }
            }
        }
    }

    /// Replace exact text matches in one column.
    pub fn replace_values(&mut self, column: &str, from: &str, to: &str) {
        let Some(i) = self.column_index(column) else { return };
        for row in &mut self.rows {
            if matches!(&row[i], Value::Text(s) if s == from) {
                row[i] = Value::Text(to.to_string());
            }
        }
    }

    /// Keep the first row per distinct value of `key_column`; rows with
    /// a null key are always kept.
    pub fn dedupe_by(&mut self, key_column: &str) {
        let Some(i) = self.column_index(key_column) else { return };
        let mut seen = std::collections::HashSet::new();
        self.rows.retain(|row| match &row[i] {
            Value::Null => true,
            v => seen.insert(v.key_part()),
        });
    }

    fn project(&mut self, keep: &[usize]) {
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }
}

fn normalize_text(s: &str) -> Option<String> {
    let without_markup = s.replace("<br>", " ").replace("<BR>", " ").replace("<br/>", " ");
    let cleaned: String = without_markup
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
