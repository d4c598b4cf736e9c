//! Luminary server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http server ──▶ api ──┬──▶ environment store ──▶ environments.json
//!                                    │
//!                                    ├──▶ spec pipeline ──▶ fetcher ──▶ spec hosts
//!                                    │        │
//!                                    │        └──▶ resolver ──▶ flattener ──▶ spec slot
//!                                    │
//!                                    └──▶ proxy executor ──▶ upstream API
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use luminary::config::{load_config, LuminaryConfig};
use luminary::lifecycle::{listen_for_signals, Shutdown};
use luminary::observability::{logging, metrics};
use luminary::HttpServer;

#[derive(Parser)]
#[command(name = "luminary")]
#[command(about = "OpenAPI spec explorer and API test proxy", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long, env = "LUMINARY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => LuminaryConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "luminary starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        data_dir = %config.storage.data_dir.display(),
        max_concurrent_fetches = config.spec.max_concurrent_fetches,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    listen_for_signals(shutdown.clone());

    let server = HttpServer::new(config).await?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
