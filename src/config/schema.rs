//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the telemetry
//! pipeline. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Execution environment. `test` disables every network push.
    pub environment: Environment,

    /// Metrics push settings.
    pub metrics: MetricsConfig,

    /// Remote log shipping settings.
    pub logging: LoggingConfig,

    /// Local diagnostic output (tracing subscriber).
    pub diagnostics: DiagnosticsConfig,

    /// Host HTTP server settings used by the bundled binary.
    pub server: ServerConfig,
}

/// Execution environment of the host process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
    Test,
}

impl Environment {
    /// Parse the value of `PIZZA_ENV`. Unknown values are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

/// Wire format used for metrics pushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// OTLP/JSON metric stream with Basic auth.
    #[default]
    Otlp,
    /// Prometheus exposition text with Bearer auth.
    Prometheus,
}

/// Metrics push configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Push endpoint URL.
    pub url: Option<String>,

    /// API key used in the Authorization header.
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,

    /// Value of the `source` attribute on every metric.
    pub source: String,

    /// Serialization used for pushes.
    pub format: WireFormat,

    /// Push interval in milliseconds.
    pub interval_ms: u64,

    /// Per-push timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            source: "jwt-pizza-service-dev".to_string(),
            format: WireFormat::Otlp,
            interval_ms: 60_000,
            timeout_ms: 5_000,
        }
    }
}

impl MetricsConfig {
    /// Endpoint and key, when both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let url = non_blank(self.url.as_deref())?;
        let key = non_blank(self.api_key.as_deref())?;
        Some((url, key))
    }
}

/// Remote log shipping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log push endpoint URL.
    pub url: Option<String>,

    /// Account identifier, sent as `Bearer <user_id>:<api_key>`.
    #[serde(alias = "userId")]
    pub user_id: Option<String>,

    /// API key paired with `user_id`.
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,

    /// Value of the `source` stream label.
    pub source: String,

    /// Per-push timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum number of records waiting for delivery.
    pub queue_capacity: usize,

    /// Largest request/response body captured for a log record, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            url: None,
            user_id: None,
            api_key: None,
            source: "jwt-pizza-service".to_string(),
            timeout_ms: 5_000,
            queue_capacity: 1_024,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl LoggingConfig {
    /// Whether every field required for delivery is present.
    pub fn is_complete(&self) -> bool {
        non_blank(self.url.as_deref()).is_some()
            && non_blank(self.user_id.as_deref()).is_some()
            && non_blank(self.api_key.as_deref()).is_some()
    }
}

/// Local diagnostic output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
