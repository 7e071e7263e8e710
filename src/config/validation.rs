//! Configuration validation.
//!
//! Returns all validation errors, not just the first. Validation is a pure
//! function and runs before the config is accepted.

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("app_name must not be empty")]
    EmptyAppName,

    #[error("listener.bind_address {0:?} is not a valid socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.log_level {0:?} is not a valid filter directive")]
    LogLevel(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.app_name.trim().is_empty() {
        errors.push(ValidationError::EmptyAppName);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
