//! Graceful close demonstration server.
//!
//! # Architecture Overview
//!
//! ```text
//!   SIGINT / SIGTERM / SIGUSR2
//!            │
//!            ▼
//!   ┌─────────────────┐   close()   ┌──────────────────────────────┐
//!   │    Shutdown     │────────────▶│        ServerProcess         │
//!   │    Sequencer    │             │  listener ── stop & drain    │
//!   │  (one-shot)     │◀────────────│  hooks ──── FirstDB.release  │
//!   └───────┬─────────┘  all hooks  │             SecondDB.release │
//!           │            settled    │             app hook         │
//!           ▼                       └──────────────────────────────┘
//!   "Server stopped." → exit(code)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use graceful_close::config::loader::load_config;
use graceful_close::config::ServerConfig;
use graceful_close::lifecycle::{signals, startup, StdProcessExit};
use graceful_close::observability;

#[derive(Parser)]
#[command(name = "graceful-close")]
#[command(about = "Server that waits for its resources to close before exiting", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    observability::logging::init(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        resources = config.resources.len(),
        timeout_secs = ?config.shutdown.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let signals = config.shutdown.signals.clone();
    let exit_code = config.shutdown.exit_code;

    let launched = startup::launch(config, Arc::new(StdProcessExit)).await?;
    tracing::info!(address = %launched.local_addr, "Server ready");

    signals::listen(launched.sequencer, &signals, exit_code).await?;

    Ok(())
}
