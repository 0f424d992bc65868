//! pizza-telemetry
//!
//! Runs the telemetry pipeline behind a minimal axum server.
//!
//! ```text
//!     Client ──▶ request id ──▶ trace ──▶ log_requests ──▶ track_requests ──▶ /health
//!                                              │                 │
//!                                              ▼                 ▼
//!                                        log shipper      metrics aggregator
//!                                              │                 │ every interval
//!                                              ▼                 ▼
//!                                         log backend      metrics backend
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use pizza_telemetry::config::{load_config, load_from_env};
use pizza_telemetry::lifecycle::wait_for_signal;
use pizza_telemetry::observability::logging::init_diagnostics;
use pizza_telemetry::{HttpServer, Telemetry};

#[derive(Parser, Debug)]
#[command(name = "pizza-telemetry", version, about = "Metrics and log pipeline for the pizza service")]
struct Args {
    /// TOML config file. Without it, defaults plus PIZZA_* environment variables are used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    init_diagnostics(&config.diagnostics);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        bind_address = %config.server.bind_address,
        metrics_format = ?config.metrics.format,
        interval_ms = config.metrics.interval_ms,
        "pizza-telemetry starting"
    );

    let telemetry = Telemetry::start(&config)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&telemetry);
    server.run(listener, wait_for_signal()).await?;

    telemetry.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
