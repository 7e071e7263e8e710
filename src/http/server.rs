//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Answer timed-out requests with the JSON envelope
//! - Serve the Prometheus exposition on `/metrics`
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Extensions, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{BoxError, ServiceBuilder};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::envelope::Envelope;
use crate::http::handlers::{
    create_data, delete_data, get_data, list_all_data, request_timeout, update_data,
};
use crate::service::DataService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn DataService>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: Arc<dyn DataService>, metrics: Option<PrometheusHandle>) -> Self {
        Self { service, metrics }
    }
}

/// HTTP server for the record service.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            app_name = %self.config.app_name,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layers added with `Router::layer` run after routing, so the timeout
/// handler still sees the matched route.
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let limit = Duration::from_secs(config.timeouts.request_secs);
    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(
            move |method: Method,
                  uri: Uri,
                  headers: HeaderMap,
                  extensions: Extensions,
                  err: BoxError| {
                request_timeout(limit, method, uri, headers, extensions, err)
            },
        ))
        .timeout(limit);

    Router::new()
        .route("/data", get(list_all_data).post(create_data))
        .route(
            "/data/{id}",
            get(get_data).put(update_data).delete(delete_data),
        )
        // no id segment: answered with InvalidInput instead of a bare 404
        .route(
            "/data/",
            get(get_data).put(update_data).delete(delete_data),
        )
        .route("/metrics", get(render_metrics))
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
        .layer(timeout)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(Envelope::message("metrics are disabled")),
        )
            .into_response(),
    }
}

async fn health() -> Json<Envelope> {
    Json(Envelope::message("ok"))
}
