//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Host service:
//!     → metrics/ (counters, revenue, latency window, active users)
//!     → logs/ (redacted records, bounded shipper queue)
//!
//! Background tasks (owned by telemetry.rs):
//!     → metrics publisher → delivery.rs → metrics backend (OTLP | exposition)
//!     → log shipper → delivery.rs → log backend (streams JSON)
//!
//! Local diagnostics:
//!     → logging.rs (tracing subscriber, stdout)
//! ```
//!
//! # Design Decisions
//! - Nothing here returns an error to request handlers
//! - Push failures are logged locally and never retried
//! - Secrets are redacted before a record leaves the caller's thread

use std::time::{SystemTime, UNIX_EPOCH};

pub mod delivery;
pub mod logging;
pub mod logs;
pub mod metrics;
pub mod redact;
pub mod system;
pub mod telemetry;

pub use delivery::{DeliveryClient, DeliveryError};
pub use logs::{HttpExchange, LogKind, LogLevel, LogRecord, RequestLogger};
pub use metrics::{MetricsAggregator, MetricsPublisher, MetricsSnapshot, PushOutcome};
pub use redact::sanitize;
pub use system::{HostProbe, HostReading, SystemSample, SystemSampler};
pub use telemetry::{Telemetry, TelemetryError};

/// Nanoseconds since the Unix epoch; zero if the clock is before it.
pub(crate) fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
