//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Environment, TelemetryConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, overlay the process environment, then validate.
pub fn load_config(path: &Path) -> Result<TelemetryConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: TelemetryConfig = toml::from_str(&content)?;
    apply_env(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults overlaid with the process environment, validated.
pub fn load_from_env() -> Result<TelemetryConfig, ConfigError> {
    let mut config = TelemetryConfig::default();
    apply_env(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `PIZZA_*` variables onto `config`.
///
/// `lookup` abstracts the environment so tests do not touch process state.
pub fn apply_env<F>(config: &mut TelemetryConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let set = |slot: &mut Option<String>, key: &str| {
        if let Some(value) = lookup(key) {
            *slot = Some(value);
        }
    };
    set(&mut config.metrics.url, "PIZZA_METRICS_URL");
    set(&mut config.metrics.api_key, "PIZZA_METRICS_API_KEY");
    set(&mut config.logging.url, "PIZZA_LOGGING_URL");
    set(&mut config.logging.user_id, "PIZZA_LOGGING_USER_ID");
    set(&mut config.logging.api_key, "PIZZA_LOGGING_API_KEY");

    if let Some(source) = lookup("PIZZA_METRICS_SOURCE") {
        config.metrics.source = source;
    }
    if let Some(source) = lookup("PIZZA_LOGGING_SOURCE") {
        config.logging.source = source;
    }
    if let Some(raw) = lookup("PIZZA_ENV") {
        match Environment::parse(&raw) {
            Some(env) => config.environment = env,
            None => tracing::warn!(value = %raw, "Ignoring unknown PIZZA_ENV"),
        }
    }
}
