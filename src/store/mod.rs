//! Record storage subsystem.
//!
//! # Data Flow
//! ```text
//! RecordService
//!     → RecordStore (capability trait)
//!     → memory.rs (DashMap, volatile)
//! ```
//!
//! # Design Decisions
//! - Single-key operations are atomic: membership test and mutation happen
//!   under the same shard lock
//! - Listing returns a snapshot in unspecified order; each entry is read
//!   whole, never torn
//! - The store is owned by the service via `Arc<dyn RecordStore>`, so a
//!   persistent backend can replace the in-memory one without touching
//!   the service or handlers
//! - Store operations are pure memory operations; no timeouts, no retries

pub mod memory;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::model::Record;

pub use memory::MemoryStore;

/// Error raised by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record with id {id} not found")]
    NotFound { id: String },

    #[error("record with id {id} already exists")]
    AlreadyExists { id: String },

    /// Backend failure that has no more specific classification.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_owned() }
    }

    pub fn already_exists(id: &str) -> Self {
        Self::AlreadyExists { id: id.to_owned() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Backend(_) => ErrorKind::Internal,
        }
    }
}

/// Capability interface over the authoritative record set.
pub trait RecordStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if `id` is present.
    fn create(&self, id: &str, value: &str) -> Result<(), StoreError>;

    /// Fetch the value stored under `id`.
    fn get(&self, id: &str) -> Result<String, StoreError>;

    /// Replace the value of an existing record.
    fn update(&self, id: &str, value: &str) -> Result<(), StoreError>;

    /// Remove an existing record.
    fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Snapshot of all records, in no particular order.
    fn list_all(&self) -> Result<Vec<Record>, StoreError>;
}
