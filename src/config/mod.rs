//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! telemetry.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (PIZZA_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → TelemetryConfig (validated, immutable)
//!     → handed to Telemetry::start once at process start
//! ```
//!
//! # Design Decisions
//! - Config is read once; there is no reload path
//! - All fields have defaults so an empty file is a valid config
//! - Missing credentials disable a pipeline instead of failing startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    DiagnosticsConfig, Environment, LoggingConfig, MetricsConfig, ServerConfig, TelemetryConfig,
    WireFormat,
};
