//! Record service binary.
//!
//! Serves create/read/update/delete/list over HTTP on a volatile in-memory
//! store, with spans per call boundary and Prometheus request metrics.

use std::path::PathBuf;

use clap::Parser;

use record_service::config::load_config;
use record_service::lifecycle::{signals, startup, Shutdown};
use record_service::observability::logging;

#[derive(Parser)]
#[command(name = "record-service")]
#[command(about = "Instrumented key/value record service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.app_name, &config.observability)?;

    tracing::info!(
        app_name = %config.app_name,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        metrics_enabled = config.observability.metrics_enabled,
        "Configuration loaded"
    );

    let (server, listener) = startup::start(config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    logging::shutdown_tracing();
    tracing::info!("Shutdown complete");
    Ok(())
}
