//! Herald CLI
//!
//! Command-line interface for the health transition webhook notification service.

use std::path::PathBuf;

use clap::Parser;
use herald::{load_config, run, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Health transition webhook notification service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ingress server port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting herald service");
    tracing::debug!(
        "Webhooks: {}, cooldown: {}s, ledger: {:?}",
        config.webhooks.len(),
        config.notifications.min_seconds_between_repeat_notifications,
        config.ledger.path
    );

    run(config).await?;

    Ok(())
}
