//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract W3C trace context (`traceparent`) from incoming requests
//! - Parent request spans to the caller's trace so service and store spans
//!   join it
//! - Inject the handler span's context into responses
//! - Mark spans as succeeded or failed
//!
//! Spans are `tracing` spans bridged to OpenTelemetry by
//! `tracing-opentelemetry`; ids come from the OpenTelemetry tracer.
//! Span fields follow OpenTelemetry naming (`otel.status_code`,
//! `error.message`) so the bridge maps them onto span status.

use std::fmt;

use axum::http::HeaderMap;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanContext, TraceContextExt, TracerProvider as _};
use opentelemetry::{global, Context};
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use tracing::field::display;
use tracing::{Span, Subscriber};
use tracing_opentelemetry::{OpenTelemetryLayer, OpenTelemetrySpanExt};
use tracing_subscriber::registry::LookupSpan;

/// Header carrying the W3C trace context.
pub const TRACEPARENT: &str = "traceparent";

/// Install the W3C trace-context propagator process-wide.
pub fn init_propagation() {
    global::set_text_map_propagator(TraceContextPropagator::new());
}

/// Tracer provider for this process.
///
/// Sampling follows the caller's `sampled` flag and samples new traces.
/// Exporters are attached by whoever deploys the service.
pub fn tracer_provider() -> TracerProvider {
    TracerProvider::builder().build()
}

/// Layer bridging `tracing` spans into OpenTelemetry spans.
pub fn otel_layer<S>(provider: &TracerProvider, service_name: &str) -> OpenTelemetryLayer<S, Tracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_owned()))
}

/// Remote context carried by the request headers; empty when the request
/// has no valid `traceparent`.
pub fn extract_context(headers: &HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HeaderExtractor(headers)))
}

/// Write `span`'s context into `headers` as `traceparent`.
pub fn inject_context(span: &Span, headers: &mut HeaderMap) {
    let cx = span.context();
    global::get_text_map_propagator(|propagator| {
        propagator.inject_context(&cx, &mut HeaderInjector(headers))
    });
}

/// Span context of `span`. Invalid when no OpenTelemetry layer is installed.
pub fn span_context(span: &Span) -> SpanContext {
    span.context().span().span_context().clone()
}

/// Parent `span` to `remote` (or make it a trace root when `remote` is
/// empty) and record the resulting ids on the span's `trace_id`,
/// `span_id` and `parent_span_id` fields.
pub fn continue_trace(span: &Span, remote: &Context) {
    let caller = remote.span().span_context().clone();
    span.set_parent(remote.clone());

    let local = span_context(span);
    if local.is_valid() {
        span.record("trace_id", display(local.trace_id()));
        span.record("span_id", display(local.span_id()));
    }
    if caller.is_valid() {
        span.record("parent_span_id", display(caller.span_id()));
    }
}

/// Mark `span` as succeeded or failed according to `result`.
///
/// The span must declare `otel.status_code` and `error.message` fields.
pub fn record_outcome<T, E: fmt::Display>(span: &Span, result: &Result<T, E>) {
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(e) => mark_error(span, e),
    }
}

/// Mark `span` as failed with `message` attached.
pub fn mark_error(span: &Span, message: impl fmt::Display) {
    span.record("otel.status_code", "ERROR");
    span.record("error.message", display(message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use axum::http::HeaderValue;
    use opentelemetry::trace::{SpanId, TraceId};
    use tracing_subscriber::layer::SubscriberExt;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn provider() -> &'static TracerProvider {
        static PROVIDER: OnceLock<TracerProvider> = OnceLock::new();
        PROVIDER.get_or_init(tracer_provider)
    }

    fn with_otel<R>(f: impl FnOnce() -> R) -> R {
        init_propagation();
        let subscriber = tracing_subscriber::registry().with(otel_layer(provider(), "test"));
        tracing::subscriber::with_default(subscriber, f)
    }

    fn sample_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, HeaderValue::from_static(SAMPLE));
        headers
    }

    fn request_span() -> Span {
        tracing::info_span!(
            "Request",
            trace_id = tracing::field::Empty,
            span_id = tracing::field::Empty,
            parent_span_id = tracing::field::Empty,
        )
    }

    #[test]
    fn test_extract_valid_traceparent() {
        init_propagation();
        let cx = extract_context(&sample_headers());
        let remote = cx.span().span_context().clone();
        assert!(remote.is_valid());
        assert!(remote.is_remote());
        assert!(remote.is_sampled());
        assert_eq!(remote.trace_id().to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(remote.span_id().to_string(), "00f067aa0ba902b7");
    }

    #[test]
    fn test_extract_rejects_malformed() {
        init_propagation();
        let bad = [
            "garbage",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
        ];
        for value in bad {
            let mut headers = HeaderMap::new();
            headers.insert(TRACEPARENT, HeaderValue::from_static(value));
            let cx = extract_context(&headers);
            assert!(!cx.span().span_context().is_valid(), "{value}");
        }
    }

    #[test]
    fn test_child_spans_join_caller_trace() {
        let (handler, child) = with_otel(|| {
            let span = request_span();
            continue_trace(&span, &extract_context(&sample_headers()));
            let child = span.in_scope(|| tracing::info_span!("Child"));
            (span_context(&span), span_context(&child))
        });

        let caller = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap();
        assert_eq!(handler.trace_id(), caller);
        assert_eq!(child.trace_id(), caller);
        assert_ne!(handler.span_id(), SpanId::from_hex("00f067aa0ba902b7").unwrap());
        assert_ne!(child.span_id(), handler.span_id());
    }

    #[test]
    fn test_root_without_caller() {
        let handler = with_otel(|| {
            let span = request_span();
            continue_trace(&span, &extract_context(&HeaderMap::new()));
            span_context(&span)
        });
        assert!(handler.is_valid());
        assert!(handler.is_sampled());
    }

    #[test]
    fn test_inject_writes_traceparent() {
        let (headers, ids) = with_otel(|| {
            let span = request_span();
            continue_trace(&span, &extract_context(&sample_headers()));
            let mut headers = HeaderMap::new();
            inject_context(&span, &mut headers);
            (headers, span_context(&span))
        });

        let value = headers.get(TRACEPARENT).unwrap().to_str().unwrap();
        assert_eq!(value, format!("00-{}-{}-01", ids.trace_id(), ids.span_id()));
    }
}
