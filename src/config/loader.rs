//! Configuration loading from disk and environment.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then
/// environment overrides. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `APP_NAME`, `PORT`, `LOG_LEVEL` and `LOG_FORMAT` overrides.
///
/// An unparsable `PORT` is ignored and the configured port kept.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup("APP_NAME").filter(|v| !v.is_empty()) {
        config.app_name = name;
    }

    if let Some(port) = lookup("PORT").and_then(|v| v.parse::<u16>().ok()) {
        if let Ok(mut addr) = config.listener.bind_address.parse::<SocketAddr>() {
            addr.set_port(port);
            config.listener.bind_address = addr.to_string();
        }
    }

    if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
        config.observability.log_level = level;
    }

    if let Some(format) = lookup("LOG_FORMAT").filter(|v| !v.is_empty()) {
        config.observability.log_format = format
            .parse::<LogFormat>()
            .map_err(|_| ConfigError::Env {
                var: "LOG_FORMAT",
                value: format,
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            app_name = "records"

            [observability]
            log_format = "pretty"
            "#,
        )
        .unwrap();

        assert_eq!(config.app_name, "records");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("APP_NAME", "svc"), ("PORT", "8081"), ("LOG_FORMAT", "PRETTY")]),
        )
        .unwrap();

        assert_eq!(config.app_name, "svc");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_bad_port_is_ignored() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, env(&[("PORT", "http")])).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:5000");
    }

    #[test]
    fn test_bad_log_format_is_rejected() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "LOG_FORMAT", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
