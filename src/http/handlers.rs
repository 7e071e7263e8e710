//! Record endpoints.
//!
//! Every handler follows the same contract:
//! 1. open a span carrying method, route and trace ids
//! 2. decode and validate input (failures are `InvalidInput`, the service
//!    is not called)
//! 3. call the [`DataService`](crate::service::DataService)
//! 4. write the envelope, mark the span from the final status, record
//!    metrics
//!
//! Requests cut off by the timeout layer get the same envelope from
//! [`request_timeout`].

use std::time::Duration;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::path::ErrorKind as PathErrorKind;
use axum::extract::{Path, State};
use axum::http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tower::timeout::error::Elapsed;
use tower::BoxError;
use tracing::Span;

use crate::error::{map_http, ApiError};
use crate::http::envelope::Envelope;
use crate::http::payload::{CreateRecord, UpdateRecord};
use crate::http::server::AppState;
use crate::http::telemetry::RequestTelemetry;
use crate::model::Record;
use crate::observability::tracing::{continue_trace, inject_context, mark_error, span_context};

macro_rules! handler_span {
    ($name:literal, $telemetry:expr) => {{
        let span = tracing::info_span!(
            $name,
            http.method = %$telemetry.method(),
            http.route = %$telemetry.route(),
            http.status_code = tracing::field::Empty,
            trace_id = tracing::field::Empty,
            span_id = tracing::field::Empty,
            parent_span_id = tracing::field::Empty,
            record.id = tracing::field::Empty,
            record.value = tracing::field::Empty,
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty,
        );
        continue_trace(&span, $telemetry.parent());
        span
    }};
}

/// `POST /data`
pub async fn create_data(
    State(state): State<AppState>,
    telemetry: RequestTelemetry,
    payload: Result<Json<CreateRecord>, JsonRejection>,
) -> Response {
    let span = handler_span!("CreateDataHandler", telemetry);
    let result: Result<Envelope, ApiError> = span.in_scope(|| {
        let Json(payload) = payload?;
        let record = payload.into_record()?;
        record_fields(&span, &record);

        state.service.create_data(&record.id, &record.value)?;
        Ok(Envelope::message("Data created successfully"))
    });
    respond(telemetry, &span, StatusCode::CREATED, result)
}

/// `GET /data/{id}`
pub async fn get_data(
    State(state): State<AppState>,
    telemetry: RequestTelemetry,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    let span = handler_span!("GetDataHandler", telemetry);
    let result: Result<Envelope<String>, ApiError> = span.in_scope(|| {
        let id = path_id(id)?;
        span.record("record.id", id.as_str());

        let value = state.service.get_data(&id)?;
        Ok(Envelope::with_data("Data retrieved successfully", value))
    });
    respond(telemetry, &span, StatusCode::OK, result)
}

/// `PUT /data/{id}`
pub async fn update_data(
    State(state): State<AppState>,
    telemetry: RequestTelemetry,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateRecord>, JsonRejection>,
) -> Response {
    let span = handler_span!("UpdateDataHandler", telemetry);
    let result: Result<Envelope, ApiError> = span.in_scope(|| {
        let id = path_id(id)?;
        span.record("record.id", id.as_str());
        let Json(payload) = payload?;
        let record = payload.into_record(id)?;
        record_fields(&span, &record);

        state.service.update_data(&record.id, &record.value)?;
        Ok(Envelope::message("Data updated successfully"))
    });
    respond(telemetry, &span, StatusCode::OK, result)
}

/// `DELETE /data/{id}`
pub async fn delete_data(
    State(state): State<AppState>,
    telemetry: RequestTelemetry,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    let span = handler_span!("DeleteDataHandler", telemetry);
    let result: Result<Envelope, ApiError> = span.in_scope(|| {
        let id = path_id(id)?;
        span.record("record.id", id.as_str());

        state.service.delete_data(&id)?;
        Ok(Envelope::message("Data deleted successfully"))
    });
    respond(telemetry, &span, StatusCode::OK, result)
}

/// `GET /data`
pub async fn list_all_data(State(state): State<AppState>, telemetry: RequestTelemetry) -> Response {
    let span = handler_span!("ListAllDataHandler", telemetry);
    let result: Result<Envelope<Vec<Record>>, ApiError> = span.in_scope(|| {
        let records = state.service.list_all_data()?;
        Ok(Envelope::with_data("Data retrieved successfully", records))
    });
    respond(telemetry, &span, StatusCode::OK, result)
}

fn path_id(id: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    let id = match id {
        Ok(Path(id)) => id,
        Err(PathRejection::MissingPathParams(_)) => return Err(ApiError::MissingId),
        Err(PathRejection::FailedToDeserializePathParams(e))
            if matches!(e.kind(), PathErrorKind::WrongNumberOfParameters { .. }) =>
        {
            return Err(ApiError::MissingId)
        }
        Err(e) => return Err(e.into()),
    };
    if id.is_empty() {
        return Err(ApiError::MissingId);
    }
    Ok(id)
}

fn record_fields(span: &Span, record: &Record) {
    span.record("record.id", record.id.as_str());
    span.record("record.value", record.value.as_str());
}

/// Error handler of the request timeout layer.
///
/// The handler future was dropped, so its telemetry guard has already
/// recorded the request; this only answers it.
pub async fn request_timeout(
    limit: Duration,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    err: BoxError,
) -> Response {
    let telemetry = RequestTelemetry::from_request(&method, &uri, &headers, &extensions);
    let span = handler_span!("RequestTimeoutHandler", telemetry);
    let error = if err.is::<Elapsed>() {
        ApiError::Timeout(limit)
    } else {
        ApiError::Middleware(err)
    };

    let response = envelope_response::<()>(&span, StatusCode::OK, Err(error));
    telemetry.dismiss();
    response
}

/// Write the envelope and close out the request's telemetry.
fn respond<T: Serialize>(
    telemetry: RequestTelemetry,
    span: &Span,
    success: StatusCode,
    result: Result<Envelope<T>, ApiError>,
) -> Response {
    let response = envelope_response(span, success, result);
    let status = response.status();

    let elapsed = telemetry.finish();
    span.in_scope(|| {
        tracing::info!(
            status = status.as_u16(),
            latency_ms = elapsed.as_secs_f64() * 1000.0,
            "Request completed"
        );
    });
    response
}

/// Build the response for `result`.
///
/// The span status mirrors the HTTP status actually sent, and the span's
/// context goes back to the caller as `traceparent`.
fn envelope_response<T: Serialize>(
    span: &Span,
    success: StatusCode,
    result: Result<Envelope<T>, ApiError>,
) -> Response {
    let cx = span_context(span);

    let mut response = match result {
        Ok(envelope) => {
            span.record("otel.status_code", "OK");
            (success, Json(envelope.traced(&cx))).into_response()
        }
        Err(err) => {
            let (status, message) = map_http(Some(&err));
            let message = message.unwrap_or_default();
            mark_error(span, &message);
            span.in_scope(|| {
                if status.is_server_error() {
                    tracing::error!(status = status.as_u16(), error = %message, "Request failed");
                } else {
                    tracing::warn!(status = status.as_u16(), error = %message, "Request rejected");
                }
            });
            (status, Json(Envelope::message(message).traced(&cx))).into_response()
        }
    };

    span.record("http.status_code", response.status().as_u16());
    inject_context(span, response.headers_mut());
    response
}
