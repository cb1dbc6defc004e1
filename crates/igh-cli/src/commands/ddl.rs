//! Ddl command implementation

use anyhow::Result;

use igh_core::{generate_all_ddl, CompiledMap};

use crate::cli::{DdlArgs, GlobalArgs};
use crate::commands::common::load_map;

/// Execute the ddl command
pub async fn execute(_args: &DdlArgs, global: &GlobalArgs) -> Result<()> {
    let (map, order, lookups) = load_map(global)?;
    let compiled = CompiledMap::compile(&map, &lookups)?;

    for statement in generate_all_ddl(&compiled, &order) {
        println!("{}", statement);
        println!();
    }
    Ok(())
}
