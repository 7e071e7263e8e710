//! Structured logging.
//!
//! JSON lines for production, pretty output for development. The JSON
//! format includes the current span and its parents, so events logged
//! while handling a request carry the request's `trace_id` and `span_id`.
//! The same subscriber carries the OpenTelemetry bridge layer.

use opentelemetry::global;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::observability::tracing::{init_propagation, otel_layer, tracer_provider};

/// Build the level filter: `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Install the global subscriber, tracer provider and propagator.
pub fn init_logging(service_name: &str, config: &ObservabilityConfig) -> Result<(), TryInitError> {
    init_propagation();
    let provider = tracer_provider();
    global::set_tracer_provider(provider.clone());

    let registry = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(otel_layer(&provider, service_name));

    match config.log_format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
}

/// Flush and stop the global tracer provider.
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}
