//! Fixed registry of static lookup tables for `LOOKUP:` expressions.
//!
//! A lookup table maps a row value (read from `key_column`) to a constant
//! integer, with a default for unregistered keys. The registry is fixed for
//! a run; an expression naming an unregistered table is a configuration
//! error caught at schema compile time.

use std::collections::HashMap;

/// One static constant table, e.g. the phase sort order.
#[derive(Debug, Clone)]
pub struct LookupTable {
    /// Source column whose value keys the table.
    pub key_column: String,
    entries: HashMap<String, i64>,
    /// Value returned for keys not present in the table.
    pub default: i64,
}

impl LookupTable {
    pub fn new(key_column: impl Into<String>, default: i64) -> Self {
        Self {
            key_column: key_column.into(),
            entries: HashMap::new(),
            default,
        }
    }

    pub fn with_entries<I, K>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, i64)>,
        K: Into<String>,
    {
        self.entries
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn get(&self, key: &str) -> i64 {
        self.entries.get(key).copied().unwrap_or(self.default)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The registry consulted by `LOOKUP:<NAME>` expressions.
#[derive(Debug, Clone, Default)]
pub struct LookupRegistry {
    tables: HashMap<String, LookupTable>,
}

impl LookupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, table: LookupTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn get(&self, name: &str) -> Option<&LookupTable> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}
