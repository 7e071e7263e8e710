//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → passed by value to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults, so no file is required
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{AppConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
