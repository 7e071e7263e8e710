//! Uniform JSON response wrapper.

use opentelemetry::trace::SpanContext;
use serde::{Deserialize, Serialize};

/// `{message, data?}` body sent with every response.
///
/// `data` is omitted on errors and on operations without a payload.
/// `trace_id`/`span_id` identify the handler span that produced the
/// response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T = ()> {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl Envelope<()> {
    /// Envelope without payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            trace_id: None,
            span_id: None,
        }
    }
}

impl<T> Envelope<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            trace_id: None,
            span_id: None,
        }
    }

    /// Attach the ids of `cx`; an invalid context leaves them out.
    pub fn traced(mut self, cx: &SpanContext) -> Self {
        if cx.is_valid() {
            self.trace_id = Some(cx.trace_id().to_string());
            self.span_id = Some(cx.span_id().to_string());
        }
        self
    }
}
