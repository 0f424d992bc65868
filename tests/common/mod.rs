//! Shared fixtures for integration tests.

#![allow(dead_code)]

use pizza_telemetry::config::{Environment, LoggingConfig, MetricsConfig, TelemetryConfig, WireFormat};
use pizza_telemetry::observability::{HostProbe, HostReading, SystemSampler};

/// Probe returning the same reading every time.
pub struct FixedProbe(pub HostReading);

impl HostProbe for FixedProbe {
    fn read(&mut self) -> HostReading {
        self.0
    }
}

/// Load 1.0 on 4 cores (25%), 6 of 10 GiB used (60%).
pub fn fixed_sampler() -> SystemSampler {
    SystemSampler::new(Box::new(FixedProbe(HostReading {
        load_one: 1.0,
        logical_cores: 4,
        total_memory: 10 * 1024 * 1024 * 1024,
        free_memory: 4 * 1024 * 1024 * 1024,
    })))
}

pub fn metrics_config(url: String, format: WireFormat) -> MetricsConfig {
    MetricsConfig {
        url: Some(url),
        api_key: Some("id:key".into()),
        source: "pizza-test".into(),
        format,
        interval_ms: 50,
        timeout_ms: 300,
    }
}

pub fn logging_config(url: String) -> LoggingConfig {
    LoggingConfig {
        url: Some(url),
        user_id: Some("42".into()),
        api_key: Some("secret".into()),
        source: "pizza-test".into(),
        timeout_ms: 300,
        queue_capacity: 16,
        max_body_bytes: 1024,
    }
}

pub fn telemetry_config(metrics: MetricsConfig, logging: LoggingConfig) -> TelemetryConfig {
    TelemetryConfig {
        environment: Environment::Development,
        metrics,
        logging,
        ..TelemetryConfig::default()
    }
}
