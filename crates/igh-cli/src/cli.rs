//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// IGH transform - star-schema transform and load for Dataverse exports
#[derive(Parser, Debug)]
#[command(name = "igh")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a YAML schema map (default: built-in Dataverse map)
    #[arg(short = 'm', long, global = true)]
    pub schema_map: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform a silver store into a star-schema warehouse
    Transform(TransformArgs),

    /// Print the CREATE TABLE statements for the target schema
    Ddl(DdlArgs),

    /// Promote a raw bronze store to a cleaned silver store
    BronzeToSilver(BronzeToSilverArgs),

    /// Audit referential integrity of an already-loaded warehouse
    Verify(VerifyArgs),
}

/// Arguments for the transform command
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Source (silver) database file, opened read-only
    #[arg(short, long)]
    pub source: String,

    /// Target warehouse database file, recreated from scratch
    #[arg(short, long)]
    pub output: String,

    /// Write the run report as JSON to this path
    #[arg(short, long)]
    pub report: Option<String>,
}

/// Arguments for the ddl command
#[derive(Args, Debug)]
pub struct DdlArgs {}

/// Arguments for the bronze-to-silver command
#[derive(Args, Debug)]
pub struct BronzeToSilverArgs {
    /// Raw bronze database file, opened read-only
    #[arg(short, long)]
    pub bronze: String,

    /// Silver database file, recreated from scratch
    #[arg(short, long)]
    pub silver: String,
}

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Warehouse database file, opened read-only
    #[arg(short, long)]
    pub db: String,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
