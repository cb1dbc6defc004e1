//! Helpers shared across commands

use anyhow::{Context, Result};
use igh_core::{LookupRegistry, SchemaMap};
use igh_etl::{builtin_load_order, builtin_lookups, builtin_schema_map};
use std::fs;

use crate::cli::GlobalArgs;

/// Resolve the schema map: a YAML file when `-m` is given, otherwise
/// the built-in Dataverse map. File-based maps load in declaration
/// order; the order is still validated against the FK graph before
/// anything runs.
pub fn load_map(global: &GlobalArgs) -> Result<(SchemaMap, Vec<String>, LookupRegistry)> {
    match &global.schema_map {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read schema map {}", path))?;
            let map = SchemaMap::from_yaml(&text)
                .with_context(|| format!("cannot parse schema map {}", path))?;
            let order = map.tables.iter().map(|t| t.name.clone()).collect();
            if global.verbose {
                println!("Loaded schema map from {} ({} tables)", path, map.tables.len());
            }
            Ok((map, order, builtin_lookups()))
        }
        None => Ok((builtin_schema_map(), builtin_load_order(), builtin_lookups())),
    }
}
