//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware: request id, trace, timeout, body limit)
//!     → telemetry.rs (request clock, trace context, metric labels)
//!     → handlers.rs (decode, validate, call DataService, span per operation)
//!     → envelope.rs ({message, data?} JSON response)
//!     → Send to client
//! ```

pub mod envelope;
pub mod handlers;
pub mod payload;
pub mod server;
pub mod telemetry;

pub use envelope::Envelope;
pub use server::{build_router, AppState, HttpServer};
pub use telemetry::RequestTelemetry;
