//! Transform command implementation

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use igh_db::DuckDbBackend;
use igh_etl::Pipeline;

use crate::cli::{GlobalArgs, TransformArgs};
use crate::commands::common::load_map;

/// Execute the transform command
pub async fn execute(args: &TransformArgs, global: &GlobalArgs) -> Result<()> {
    let (map, order, lookups) = load_map(global)?;

    let source = DuckDbBackend::open_read_only(Path::new(&args.source))
        .with_context(|| format!("cannot open source database {}", args.source))?;

    // The warehouse is rebuilt from scratch on every run.
    let output_path = Path::new(&args.output);
    if output_path.exists() {
        fs::remove_file(output_path)
            .with_context(|| format!("cannot remove existing output {}", args.output))?;
        // Also clean WAL file if it exists
        let wal_path = output_path.with_extension("duckdb.wal");
        if wal_path.exists() {
            let _ = fs::remove_file(&wal_path);
        }
    }
    let target = DuckDbBackend::from_path(output_path)
        .with_context(|| format!("cannot create output database {}", args.output))?;

    println!("Transforming {} -> {}", args.source, args.output);
    let report = Pipeline::new(&source, &target)
        .run(&map, &order, &lookups)
        .await?;

    println!();
    println!("Run {} loaded {} tables:", report.run_id, report.tables.len());
    for table in &report.tables {
        if table.rows_dropped > 0 {
            println!(
                "  {:<40} {:>8} rows ({} dropped)",
                table.name, table.rows_inserted, table.rows_dropped
            );
        } else {
            println!("  {:<40} {:>8} rows", table.name, table.rows_inserted);
        }
    }
    println!("  {:<40} {:>8} rows total", "", report.total_rows());

    if report.is_clean() {
        println!();
        println!("Referential integrity: clean");
    } else {
        println!();
        println!(
            "Referential integrity: {} warning(s)",
            report.referential_warnings.len()
        );
        for w in &report.referential_warnings {
            println!(
                "  {}.{}: {} unresolved reference(s) to {}",
                w.table, w.column, w.orphan_rows, w.dimension
            );
        }
    }

    if let Some(path) = &args.report {
        fs::write(path, report.to_json()?)
            .with_context(|| format!("cannot write report {}", path))?;
        if global.verbose {
            println!("Report written to {}", path);
        }
    }

    Ok(())
}
