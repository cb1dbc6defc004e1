//! Surrogate-key caches for loaded dimensions.

use igh_core::KeyTuple;
use std::collections::HashMap;

/// Maps natural-key tuples to surrogate keys for every dimension that
/// has been inserted so far. Insert-only: the first surrogate key
/// registered for a natural key wins, matching the insert order of the
/// dimension itself.
#[derive(Default)]
pub struct DimKeyCache {
    tables: HashMap<String, HashMap<KeyTuple, i64>>,
}

impl DimKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dimension row. Returns false if the natural key was
    /// already present (the existing surrogate key is kept).
    pub fn register(&mut self, dimension: &str, natural_key: KeyTuple, surrogate: i64) -> bool {
        let table = self.tables.entry(dimension.to_string()).or_default();
        if table.contains_key(&natural_key) {
            return false;
        }
        table.insert(natural_key, surrogate);
        true
    }

    pub fn lookup(&self, dimension: &str, natural_key: &KeyTuple) -> Option<i64> {
        self.tables.get(dimension)?.get(natural_key).copied()
    }

    /// Whether any keys have been registered for a dimension.
    pub fn has_dimension(&self, dimension: &str) -> bool {
        self.tables.contains_key(dimension)
    }

    pub fn table_len(&self, dimension: &str) -> usize {
        self.tables.get(dimension).map_or(0, |t| t.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use igh_core::KeyPart;

    #[test]
    fn test_register_and_lookup() {
        let mut cache = DimKeyCache::new();
        let key = vec![KeyPart::Text("p-42".to_string())];
        assert!(cache.register("dim_product", key.clone(), 7));
        assert_eq!(cache.lookup("dim_product", &key), Some(7));
        assert_eq!(cache.table_len("dim_product"), 1);
    }

    #[test]
    fn test_first_write_wins() {
        let mut cache = DimKeyCache::new();
        let key = vec![KeyPart::Int(3)];
        assert!(cache.register("dim_phase", key.clone(), 1));
        assert!(!cache.register("dim_phase", key.clone(), 99));
        assert_eq!(cache.lookup("dim_phase", &key), Some(1));
    }

    #[test]
    fn test_unknown_dimension() {
        let cache = DimKeyCache::new();
        assert_eq!(cache.lookup("dim_missing", &vec![KeyPart::Null]), None);
        assert!(!cache.has_dimension("dim_missing"));
    }
}
