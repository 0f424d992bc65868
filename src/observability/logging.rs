//! Local diagnostic output.
//!
//! Push failures, dropped records and lifecycle events are reported through
//! `tracing`; this module installs the subscriber that prints them.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - JSON lines for production collectors, human format otherwise

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::DiagnosticsConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(config: &DiagnosticsConfig) -> String {
    format!(
        "pizza_telemetry={level},tower_http={level}",
        level = config.level
    )
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_diagnostics(config: &DiagnosticsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("Diagnostics subscriber already installed");
    }
}
