//! Metrics aggregation and push.
//!
//! # Data Flow
//! ```text
//! track_requests middleware ─┐
//! record_auth / record_pizza ─┼─▶ aggregator.rs (counters, revenue, latency window)
//! record_active_user ────────┘            │
//!                                         │ snapshot_and_reset (every interval)
//!                                         ▼
//!                  publisher.rs ──▶ export.rs (OTLP JSON | exposition text)
//!                                         │
//!                                         ▼
//!                                  delivery (POST, 5s deadline)
//! ```
//!
//! # Metrics
//! - `http_requests_*`, `auth_*_total`, `pizza_*_total` (sum): per-window counts
//! - `latency_avg_ms` (gauge): mean of the last 200 samples
//! - `system_cpu_percent`, `system_mem_percent` (gauge): host utilisation
//! - `pizza_revenue_per_minute`, `active_users` (gauge)

pub mod aggregator;
pub mod export;
pub mod latency;
pub mod publisher;

pub use aggregator::{CounterSet, MetricsAggregator, MetricsSnapshot};
pub use export::{MetricKind, MetricPoint};
pub use latency::{LatencyWindow, LATENCY_WINDOW_CAPACITY};
pub use publisher::{MetricsPublisher, PushOutcome};
