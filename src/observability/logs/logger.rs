//! Structured event logging to the remote log backend.
//!
//! Every entry point is synchronous and fire-and-forget: it builds a
//! redacted [`LogRecord`] and hands it to the shipper queue. Nothing here
//! returns an error or blocks the caller.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::time::Duration;

use serde_json::{json, Map, Value};

use super::record::{LogKind, LogLevel, LogRecord};
use super::shipper::LogShipper;

/// Default cap on captured body size when none is configured.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// One completed HTTP exchange, as observed by the logging middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpExchange {
    pub method: String,
    /// Path and query of the original request URI.
    pub path: String,
    pub status: u16,
    pub duration: Duration,
    pub has_auth_header: bool,
    pub request_id: Option<String>,
    pub request_body: Value,
    pub response_body: Value,
    /// Response capture stopped at the body size limit.
    pub response_truncated: bool,
}

/// Front door of the log pipeline.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    shipper: Option<LogShipper>,
    max_body_bytes: usize,
}

impl RequestLogger {
    pub fn new(shipper: LogShipper, max_body_bytes: usize) -> Self {
        Self {
            shipper: Some(shipper),
            max_body_bytes,
        }
    }

    /// A logger that drops everything.
    pub fn disabled() -> Self {
        Self {
            shipper: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shipper.is_some()
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    fn emit(&self, level: LogLevel, kind: LogKind, payload: Value, metadata: Map<String, Value>) {
        if let Some(shipper) = &self.shipper {
            shipper.enqueue(LogRecord::new(level, kind, &payload, metadata));
        }
    }

    /// Log a finished HTTP exchange; severity follows the status code.
    pub fn log_http(&self, exchange: HttpExchange) {
        let HttpExchange {
            method,
            path,
            status,
            duration,
            has_auth_header,
            request_id,
            request_body,
            response_body,
            response_truncated,
        } = exchange;

        let mut payload = json!({
            "method": method,
            "path": path,
            "status": status,
            "durationMs": duration.as_millis() as u64,
            "hasAuthHeader": has_auth_header,
            "requestBody": request_body,
            "responseBody": response_body,
        });
        if let Some(map) = payload.as_object_mut() {
            if let Some(id) = request_id {
                map.insert("requestId".into(), Value::String(id));
            }
            if response_truncated {
                map.insert("responseTruncated".into(), Value::Bool(true));
            }
        }

        let mut metadata = Map::new();
        metadata.insert("path".into(), Value::String(path));
        metadata.insert("method".into(), Value::String(method));
        metadata.insert("status".into(), json!(status));

        self.emit(LogLevel::from_status(status), LogKind::Http, payload, metadata);
    }

    /// Log a storage-layer query.
    pub fn log_query(&self, query: &str, params: &Value) {
        self.emit(
            LogLevel::Info,
            LogKind::Db,
            json!({ "query": query, "params": params }),
            Map::new(),
        );
    }

    /// Log a call to the upstream pizza factory. A missing status counts as 200.
    pub fn log_factory_call(&self, request_body: &Value, response_body: &Value, status: Option<u16>) {
        let level = LogLevel::from_status(status.unwrap_or(200));
        self.emit(
            level,
            LogKind::Factory,
            json!({
                "status": status,
                "requestBody": request_body,
                "responseBody": response_body,
            }),
            Map::new(),
        );
    }

    /// Log an unhandled error with its cause chain.
    pub fn log_error(&self, error: &(dyn Error + 'static), context: Value) {
        self.emit(
            LogLevel::Error,
            LogKind::Error,
            json!({
                "message": error.to_string(),
                "stack": stack_trace(error),
                "context": context,
            }),
            Map::new(),
        );
    }
}

/// The error's source chain, followed by a backtrace when capture is enabled.
fn stack_trace(error: &(dyn Error + 'static)) -> String {
    let mut lines = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        lines.push(format!("caused by: {cause}"));
        source = cause.source();
    }

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        lines.push(backtrace.to_string());
    }
    lines.join("\n")
}
