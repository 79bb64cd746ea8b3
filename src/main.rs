use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cricket_tracker::api::Dispatcher;
use cricket_tracker::config::AppConfig;
use cricket_tracker::server;
use cricket_tracker::storage::PersistenceStore;

#[derive(Parser)]
#[command(name = "cricket-tracker")]
#[command(about = "Local cricket squad tracker with a minimal HTTP stats API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port number (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Data file path (overrides config)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cricket-tracker v{}", env!("CARGO_PKG_VERSION"));

    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)
            .with_context(|| format!("loading config from {}", cli.config.display()))?
    } else {
        tracing::info!(
            "no config file at {}, using defaults",
            cli.config.display()
        );
        AppConfig::default()
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(data_file) = cli.data_file {
        config.data_file = data_file;
    }
    config.validate().context("invalid configuration")?;

    let store = PersistenceStore::new(&config.data_file);
    let registry = store
        .load()
        .with_context(|| format!("loading registry from {}", config.data_file.display()))?;

    let dispatcher = Dispatcher::new(registry, store);
    server::run(&config.bind_addr(), dispatcher)
        .await
        .context("server failed")?;

    Ok(())
}
