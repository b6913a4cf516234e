//! ESG monitor CLI — periodic ESG-in-real-estate monitoring.
//!
//! Collects recent content per query catalog, classifies it by theme,
//! synthesizes a weekly digest, and tracks theme trends over time.

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
