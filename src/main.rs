use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use reelboard::cli::{self, Cli};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    let cli = Cli::parse();
    cli::run(cli).await
}
