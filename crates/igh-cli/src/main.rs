//! IGH transform CLI - loads a CRM-style normalized store into a star schema

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{bronze, ddl, transform, verify};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        cli::Commands::Transform(args) => transform::execute(args, &cli.global).await,
        cli::Commands::Ddl(args) => ddl::execute(args, &cli.global).await,
        cli::Commands::BronzeToSilver(args) => bronze::execute(args, &cli.global).await,
        cli::Commands::Verify(args) => verify::execute(args, &cli.global).await,
    }
}
