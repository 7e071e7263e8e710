//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use record_service::config::AppConfig;
use record_service::http::{build_router, AppState, Envelope, HttpServer};
use record_service::lifecycle::Shutdown;
use record_service::observability::tracing::{init_propagation, otel_layer, tracer_provider};
use record_service::{MemoryStore, RecordService};

/// Install the OpenTelemetry bridge once per test binary, so responses
/// carry real trace ids.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        init_propagation();
        let provider = tracer_provider();
        let layer = otel_layer(&provider, "record-service-test");
        opentelemetry::global::set_tracer_provider(provider);
        let _ = tracing_subscriber::registry().with(layer).try_init();
    });
}

/// Fresh state over an empty in-memory store.
#[allow(dead_code)]
pub fn test_state() -> AppState {
    let store = Arc::new(MemoryStore::new());
    AppState::new(Arc::new(RecordService::new(store)), None)
}

/// Router with default config and an empty store.
#[allow(dead_code)]
pub fn test_router() -> Router {
    init_tracing();
    build_router(&AppConfig::default(), test_state())
}

#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Envelope<Value>,
}

/// Send one request through the router.
#[allow(dead_code)]
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    send_with_headers(router, method, uri, body, &[]).await
}

#[allow(dead_code)]
pub async fn send_with_headers(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
    headers: &[(&str, &str)],
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_owned())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("body is not an envelope ({e}): {}", String::from_utf8_lossy(&bytes)));

    TestResponse { status, headers, body }
}

/// Start a real server on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server() -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    spawn_server_with(AppConfig::default()).await
}

/// Start a real server with `config` on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server_with(
    mut config: AppConfig,
) -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    init_tracing();
    config.listener.bind_address = "127.0.0.1:0".into();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, test_state());
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    (addr, shutdown, handle)
}
