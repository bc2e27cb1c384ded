use clap::Parser;
use sportsdata_proxy::client::{build_provider, TokenBucket};
use sportsdata_proxy::dispatcher::Dispatcher;
use sportsdata_proxy::server::{serve, AppState};
use sportsdata_proxy::{Config, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reverse proxy for sports data APIs.
#[derive(Debug, Parser)]
#[command(name = "sportsdata-proxy", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port.
    #[arg(long)]
    port: Option<u16>,

    /// Log filter when RUST_LOG is unset (e.g. "info", "sportsdata_proxy=debug").
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    let provider = build_provider(&config.provider)?;
    let limiter = Arc::new(TokenBucket::new(
        config.rate_limit.capacity,
        config.rate_limit.refill_rate_per_second,
    ));
    let dispatcher = Dispatcher::new(provider, limiter, config.retry.to_retry_config());

    info!(
        provider = config.provider.name,
        rate = config.rate_limit.refill_rate_per_second,
        burst = config.rate_limit.capacity,
        max_retries = config.retry.max_retries,
        "starting sports data proxy"
    );

    serve(&config, Arc::new(AppState { dispatcher })).await
}
