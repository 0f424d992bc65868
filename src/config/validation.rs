//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and URL shape.
//! Every problem is reported, not just the first. Missing credentials are
//! not an error: they only disable the affected pipeline.

use thiserror::Error;

use crate::config::schema::TelemetryConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &TelemetryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("metrics.interval_ms", config.metrics.interval_ms),
        ("metrics.timeout_ms", config.metrics.timeout_ms),
        ("logging.timeout_ms", config.logging.timeout_ms),
        ("logging.queue_capacity", config.logging.queue_capacity as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    check_url("metrics.url", config.metrics.url.as_deref(), &mut errors);
    check_url("logging.url", config.logging.url.as_deref(), &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: Option<&str>, errors: &mut Vec<ValidationError>) {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    let ok = url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: raw.to_string(),
        });
    }
}
