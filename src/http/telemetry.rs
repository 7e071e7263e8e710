//! Per-request telemetry guard.
//!
//! # Responsibilities
//! - Start the latency clock at handler entry
//! - Resolve metric labels (method, matched route)
//! - Carry the caller's trace context extracted from the request headers
//! - Record the request counter and latency sample exactly once
//!
//! # Design Decisions
//! - Extracted like any other handler argument, so every instrumented
//!   handler gets it the same way
//! - Recording happens on `finish` or, for requests whose future is
//!   dropped mid-flight, on `Drop`

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::extract::{FromRequestParts, MatchedPath};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, Method, Uri};
use opentelemetry::Context;

use crate::observability::metrics::record_request;
use crate::observability::tracing::extract_context;

pub struct RequestTelemetry {
    method: Method,
    route: String,
    parent: Context,
    started: Instant,
    recorded: bool,
}

impl RequestTelemetry {
    pub fn start(method: Method, route: impl Into<String>, parent: Context) -> Self {
        Self {
            method,
            route: route.into(),
            parent,
            started: Instant::now(),
            recorded: false,
        }
    }

    /// Labels and caller context of a routed request.
    pub fn from_request(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        let route = extensions
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| uri.path().to_owned());
        Self::start(method.clone(), route, extract_context(headers))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Route template used as the `path` metric label.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Caller's trace context; empty when the request started a new trace.
    pub fn parent(&self) -> &Context {
        &self.parent
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record the counter and latency sample; returns the measured latency.
    pub fn finish(mut self) -> Duration {
        self.record()
    }

    /// Close without recording, for requests whose sample is recorded by
    /// another guard.
    pub fn dismiss(mut self) {
        self.recorded = true;
    }

    fn record(&mut self) -> Duration {
        let elapsed = self.elapsed();
        if !self.recorded {
            self.recorded = true;
            record_request(self.method.as_str(), &self.route, elapsed);
        }
        elapsed
    }
}

impl Drop for RequestTelemetry {
    fn drop(&mut self) {
        if !self.recorded {
            tracing::debug!(
                method = %self.method,
                route = %self.route,
                "Request dropped before a response was written"
            );
            self.record();
        }
    }
}

impl<S> FromRequestParts<S> for RequestTelemetry
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_request(
            &parts.method,
            &parts.uri,
            &parts.headers,
            &parts.extensions,
        ))
    }
}
