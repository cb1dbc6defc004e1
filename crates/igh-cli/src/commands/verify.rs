//! Verify command implementation

use anyhow::{bail, Context, Result};
use std::path::Path;

use igh_core::CompiledMap;
use igh_db::DuckDbBackend;
use igh_etl::Loader;

use crate::cli::{GlobalArgs, VerifyArgs};
use crate::commands::common::load_map;

/// Execute the verify command
pub async fn execute(args: &VerifyArgs, global: &GlobalArgs) -> Result<()> {
    let (map, order, lookups) = load_map(global)?;
    let compiled = CompiledMap::compile(&map, &lookups)?;

    let db = DuckDbBackend::open_read_only(Path::new(&args.db))
        .with_context(|| format!("cannot open database {}", args.db))?;

    let warnings = Loader::new(&db).verify_foreign_keys(&compiled, &order).await?;
    if warnings.is_empty() {
        println!("Referential integrity: clean");
        return Ok(());
    }

    for w in &warnings {
        println!(
            "  {}.{}: {} orphan reference(s) to {}",
            w.table, w.column, w.orphan_rows, w.dimension
        );
    }
    bail!("{} referential integrity warning(s)", warnings.len());
}
