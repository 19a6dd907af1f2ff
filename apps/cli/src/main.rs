//! QaBase CLI: run the moderation API and manage the knowledge base.
//!
//! Serves the HTTP API, imports CSV files and offers a few moderation
//! shortcuts against the local database.

mod commands;

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
