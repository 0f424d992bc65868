//! Log records and their push encoding.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::observability::redact::sanitize;
use crate::observability::unix_nanos;

/// Severity attached to a shipped record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `>= 500` is error, `>= 400` is warn, anything else info.
    pub fn from_status(status: u16) -> Self {
        if status >= 500 {
            Self::Error
        } else if status >= 400 {
            Self::Warn
        } else {
            Self::Info
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// What produced the record; shipped as the `type` stream label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Http,
    Db,
    Factory,
    Error,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Db => "db",
            Self::Factory => "factory",
            Self::Error => "error",
        }
    }
}

/// A single loggable event.
///
/// The payload is redacted on construction, so a `LogRecord` never holds a
/// secret value.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    timestamp_nanos: u128,
    level: LogLevel,
    kind: LogKind,
    payload: Value,
    metadata: Map<String, Value>,
}

impl LogRecord {
    pub fn new(level: LogLevel, kind: LogKind, payload: &Value, metadata: Map<String, Value>) -> Self {
        Self {
            timestamp_nanos: unix_nanos(),
            level,
            kind,
            payload: sanitize(payload),
            metadata,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn timestamp_nanos(&self) -> u128 {
        self.timestamp_nanos
    }

    /// Encode as a single-stream push body.
    ///
    /// `values` holds `[timestamp string, payload as JSON string, metadata]`.
    pub fn to_push_body(&self, source: &str) -> Result<Vec<u8>, serde_json::Error> {
        let line = serde_json::to_string(&self.payload)?;
        let body = json!({
            "streams": [{
                "stream": {
                    "source": source,
                    "level": self.level,
                    "type": self.kind,
                },
                "values": [[
                    self.timestamp_nanos.to_string(),
                    line,
                    self.metadata,
                ]],
            }],
        });
        serde_json::to_vec(&body)
    }
}
