//! In-process observability pipeline for the pizza ordering service.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::TelemetryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::{Telemetry, TelemetryError};
