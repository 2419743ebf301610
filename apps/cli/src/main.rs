//! postsmith CLI — automated article generation and publishing.
//!
//! Turns configured topic keywords into referenced, SEO-tagged articles
//! and publishes them to a WordPress-compatible CMS.

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
