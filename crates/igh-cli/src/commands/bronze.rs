//! Bronze-to-silver command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use igh_db::DuckDbBackend;
use igh_etl::silver::{bronze_to_silver, builtin_cleanup_specs};

use crate::cli::{BronzeToSilverArgs, GlobalArgs};

/// Execute the bronze-to-silver command
pub async fn execute(args: &BronzeToSilverArgs, global: &GlobalArgs) -> Result<()> {
    let bronze = DuckDbBackend::open_read_only(Path::new(&args.bronze))
        .with_context(|| format!("cannot open bronze database {}", args.bronze))?;

    let silver_path = Path::new(&args.silver);
    if silver_path.exists() {
        fs::remove_file(silver_path)
            .with_context(|| format!("cannot remove existing silver {}", args.silver))?;
        let wal_path = silver_path.with_extension("duckdb.wal");
        if wal_path.exists() {
            let _ = fs::remove_file(&wal_path);
        }
    }
    let silver = DuckDbBackend::from_path(silver_path)
        .with_context(|| format!("cannot create silver database {}", args.silver))?;

    println!("Promoting {} -> {}", args.bronze, args.silver);
    let loads = bronze_to_silver(&bronze, &silver, &builtin_cleanup_specs()).await?;

    for load in &loads {
        if global.verbose && load.rows_dropped > 0 {
            println!(
                "  {:<40} {:>8} rows ({} deduplicated)",
                load.name, load.rows_inserted, load.rows_dropped
            );
        } else {
            println!("  {:<40} {:>8} rows", load.name, load.rows_inserted);
        }
    }
    println!("Promoted {} tables", loads.len());
    Ok(())
}
