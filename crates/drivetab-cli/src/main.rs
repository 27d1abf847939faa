//! drivetab CLI entry point.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use drivetab_cli::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let fallback = match cli.verbose {
        0 => "warn,drivetab=info",
        1 => "info,drivetab=debug",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .init();

    drivetab_cli::run(cli).await?;
    Ok(())
}
