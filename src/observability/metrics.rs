//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_http_requests_total` (counter): requests by method, path
//! - `app_http_latency_seconds` (histogram): handler latency by method, path
//!
//! `path` is the matched route template, so record ids never become labels.

use std::time::Duration;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const REQUESTS_TOTAL: &str = "app_http_requests_total";
pub const LATENCY_SECONDS: &str = "app_http_latency_seconds";

/// Latency buckets in seconds, tuned for in-memory request handling.
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Prometheus builder preconfigured with the service's buckets and labels.
pub fn builder(app_name: &str) -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .add_global_label("service", app_name)
        .set_buckets_for_metric(Matcher::Full(LATENCY_SECONDS.to_string()), LATENCY_BUCKETS)
}

/// Install the global Prometheus recorder.
///
/// The returned handle renders the exposition served on `GET /metrics`.
pub fn init_metrics(app_name: &str) -> Result<PrometheusHandle, BuildError> {
    let handle = builder(app_name)?.install_recorder()?;
    describe_metrics();
    tracing::info!(service = app_name, "Prometheus recorder installed");
    Ok(handle)
}

pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(LATENCY_SECONDS, Unit::Seconds, "Request latency");
}

/// Record one handled request.
pub fn record_request(method: &str, path: &str, elapsed: Duration) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_owned(),
        "path" => path.to_owned()
    )
    .increment(1);
    metrics::histogram!(
        LATENCY_SECONDS,
        "method" => method.to_owned(),
        "path" => path.to_owned()
    )
    .record(elapsed.as_secs_f64());
}
