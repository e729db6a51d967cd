//! promptarena binary entry point.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before any configuration is read.
    dotenvy::dotenv().ok();
    init_tracing();

    let args = cli::Cli::parse();
    cli::run(args).await
}

/// Initialize tracing from RUST_LOG, falling back to LOG_LEVEL, then "info".
///
/// Production deployments get JSON lines for log shippers; everything else
/// gets the human-readable format.
fn init_tracing() {
    let fallback = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let production = std::env::var("ENVIRONMENT")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);
    if production {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
