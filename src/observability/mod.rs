//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handler / service / store produce:
//!     → logging.rs (structured log events, trace-correlated)
//!     → metrics.rs (request counter, latency histogram)
//!     → tracing.rs (spans, W3C trace context)
//!
//! Consumers (external telemetry sink):
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape of GET /metrics)
//!     → Distributed tracing backend
//! ```
//!
//! # Design Decisions
//! - `tracing` spans are the span interface, bridged to OpenTelemetry by
//!   `tracing-opentelemetry`; exporters are a deployment concern
//! - `metrics` facade decouples recording from the Prometheus recorder
//! - Trace ids flow into every log line through span fields

pub mod logging;
pub mod metrics;
pub mod tracing;
