//! Error taxonomy and its HTTP mapping.
//!
//! Every layer classifies its failures into one [`ErrorKind`]:
//!
//! | Kind            | Meaning                                  | Status |
//! |-----------------|------------------------------------------|--------|
//! | `InvalidInput`  | malformed or missing caller-supplied data | 400    |
//! | `NotFound`      | referenced record does not exist          | 404    |
//! | `AlreadyExists` | record id is already taken                | 409    |
//! | `Internal`      | anything else                             | 500    |
//!
//! [`map_http`] is the only place where errors become status codes.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use thiserror::Error;

use crate::model::FieldError;
use crate::service::ServiceError;
use crate::store::StoreError;

/// Classification shared by the store, service and handler layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detected while handling an HTTP request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request payload: {0}")]
    Payload(#[from] JsonRejection),

    #[error("invalid path parameter: {0}")]
    Path(#[from] PathRejection),

    #[error("id parameter is required")]
    MissingId,

    #[error("validation error: {0}")]
    Validation(#[from] FieldError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("middleware failure: {0}")]
    Middleware(tower::BoxError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Payload(_) | Self::Path(_) | Self::MissingId | Self::Validation(_) => {
                ErrorKind::InvalidInput
            }
            Self::Service(e) => e.kind(),
            Self::Timeout(_) | Self::Middleware(_) => ErrorKind::Internal,
        }
    }
}

/// Find the classification of `err`, looking through its source chain.
///
/// Returns `None` when no error in the chain belongs to this crate's
/// taxonomy.
pub fn classify(err: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(e) = e.downcast_ref::<ApiError>() {
            return Some(e.kind());
        }
        if let Some(e) = e.downcast_ref::<ServiceError>() {
            return Some(e.kind());
        }
        if let Some(e) = e.downcast_ref::<StoreError>() {
            return Some(e.kind());
        }
        if e.is::<FieldError>() {
            return Some(ErrorKind::InvalidInput);
        }
        current = e.source();
    }
    None
}

/// Translate an operation outcome into a status code and message.
///
/// No error maps to `200` without a message. Errors outside the taxonomy
/// become `500` with an `unexpected error` message; they are never
/// reported as success.
pub fn map_http(err: Option<&(dyn StdError + 'static)>) -> (StatusCode, Option<String>) {
    let Some(err) = err else {
        return (StatusCode::OK, None);
    };

    match classify(err) {
        Some(kind) => (kind.status(), Some(err.to_string())),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Some(format!("unexpected error: {err}")),
        ),
    }
}
