//! Key/value record service with end-to-end request instrumentation.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::handlers ──▶ service::RecordService ──▶ store::MemoryStore
//!                     (span, metrics,    (span, field checks,       (DashMap, atomic
//!                      validation)        error context)             per key)
//!     ◀────────────── envelope {message, data?} + status from error::map_http
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod service;
pub mod store;

pub use config::AppConfig;
pub use error::{map_http, ApiError, ErrorKind};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use model::Record;
pub use service::{DataService, RecordService, ServiceError};
pub use store::{MemoryStore, RecordStore, StoreError};
