//! Remote log pipeline.
//!
//! # Data Flow
//! ```text
//! log_requests middleware ─┐
//! log_query / log_factory ─┼─▶ logger.rs ─▶ record.rs (redact, classify)
//! log_error ───────────────┘                     │
//!                                                ▼
//!                         shipper.rs (bounded mpsc) ─▶ worker ─▶ POST
//! ```

pub mod logger;
pub mod record;
pub mod shipper;

pub use logger::{HttpExchange, RequestLogger};
pub use record::{LogKind, LogLevel, LogRecord};
pub use shipper::{LogShipper, ShipperWorker};
