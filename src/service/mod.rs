//! Domain service subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → DataService (span per operation, field checks)
//!     → RecordStore
//!     → ServiceError (operation context, kind preserved)
//! ```
//!
//! # Design Decisions
//! - Transport independent: no HTTP types cross this boundary
//! - Store errors are wrapped, never reclassified
//! - One span per operation, closed on every exit path

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::field::Empty;
use tracing::Span;

use crate::error::ErrorKind;
use crate::model::{self, FieldError, Record};
use crate::observability::tracing::record_outcome;
use crate::store::{RecordStore, StoreError};

/// Operations exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    ListAll,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ListAll => "list",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`DataService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid record: {0}")]
    Invalid(#[from] FieldError),

    #[error("failed to {operation} data: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    pub fn store(operation: Operation, source: StoreError) -> Self {
        Self::Store { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::Store { source, .. } => source.kind(),
        }
    }
}

/// Record operations independent of any transport.
pub trait DataService: Send + Sync {
    fn create_data(&self, id: &str, value: &str) -> Result<(), ServiceError>;

    fn get_data(&self, id: &str) -> Result<String, ServiceError>;

    fn update_data(&self, id: &str, value: &str) -> Result<(), ServiceError>;

    fn delete_data(&self, id: &str) -> Result<(), ServiceError>;

    fn list_all_data(&self) -> Result<Vec<Record>, ServiceError>;
}

/// Instrumented [`DataService`] over any [`RecordStore`].
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

/// Run `op` inside `span` and mark the span with its outcome.
fn traced<T>(span: Span, op: impl FnOnce() -> Result<T, ServiceError>) -> Result<T, ServiceError> {
    let result = span.in_scope(op);
    record_outcome(&span, &result);
    result
}

impl DataService for RecordService {
    fn create_data(&self, id: &str, value: &str) -> Result<(), ServiceError> {
        let span = tracing::info_span!(
            "CreateDataService",
            record.id = id,
            record.value = value,
            otel.status_code = Empty,
            error.message = Empty,
        );
        traced(span, || {
            model::validate_id(id)?;
            model::validate_value(value)?;
            self.store
                .create(id, value)
                .map_err(|e| ServiceError::store(Operation::Create, e))
        })
    }

    fn get_data(&self, id: &str) -> Result<String, ServiceError> {
        let span = tracing::info_span!(
            "GetDataService",
            record.id = id,
            otel.status_code = Empty,
            error.message = Empty,
        );
        traced(span, || {
            model::validate_id(id)?;
            self.store
                .get(id)
                .map_err(|e| ServiceError::store(Operation::Get, e))
        })
    }

    fn update_data(&self, id: &str, value: &str) -> Result<(), ServiceError> {
        let span = tracing::info_span!(
            "UpdateDataService",
            record.id = id,
            record.value = value,
            otel.status_code = Empty,
            error.message = Empty,
        );
        traced(span, || {
            model::validate_id(id)?;
            model::validate_value(value)?;
            self.store
                .update(id, value)
                .map_err(|e| ServiceError::store(Operation::Update, e))
        })
    }

    fn delete_data(&self, id: &str) -> Result<(), ServiceError> {
        let span = tracing::info_span!(
            "DeleteDataService",
            record.id = id,
            otel.status_code = Empty,
            error.message = Empty,
        );
        traced(span, || {
            model::validate_id(id)?;
            self.store
                .delete(id)
                .map_err(|e| ServiceError::store(Operation::Delete, e))
        })
    }

    fn list_all_data(&self) -> Result<Vec<Record>, ServiceError> {
        let span = tracing::info_span!(
            "ListAllDataService",
            otel.status_code = Empty,
            error.message = Empty,
        );
        traced(span, || {
            tracing::debug!("Listing all records");
            self.store
                .list_all()
                .map_err(|e| ServiceError::store(Operation::ListAll, e))
        })
    }
}
