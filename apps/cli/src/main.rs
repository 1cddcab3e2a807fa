//! ligbench CLI: aggregate structure-prediction benchmark results.
//!
//! Each pipeline stage is a subcommand that reads and writes CSV, so stages
//! can be rerun or chained by hand.

mod commands;
mod progress;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
