//! Startup orchestration.
//!
//! Fail fast: any startup error is fatal. Subsystems initialize in order,
//! and the listener is bound last so traffic only arrives when ready.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::{AppState, HttpServer};
use crate::observability::metrics;
use crate::service::RecordService;
use crate::store::MemoryStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Wire store → service → state. Installs the global metrics recorder
/// when enabled.
pub fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let handle = if config.observability.metrics_enabled {
        Some(metrics::init_metrics(&config.app_name)?)
    } else {
        tracing::info!("Metrics disabled");
        None
    };

    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(RecordService::new(store));
    Ok(AppState::new(service, handle))
}

/// Build the server and bind its listener.
pub async fn start(config: AppConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let state = build_state(&config)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok((HttpServer::new(config, state), listener))
}
