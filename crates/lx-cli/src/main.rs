//! Lexportal operator CLI
//!
//! Runs the asset pipeline against a local blob store: validate files,
//! upload them, delete by locator, and publish a news article end to end.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
