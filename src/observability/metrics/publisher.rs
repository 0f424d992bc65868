//! Periodic metrics push.
//!
//! # Responsibilities
//! - Drive push cycles from a tokio interval
//! - Snapshot and reset the aggregator on every tick, enabled or not
//! - Sample the host, encode, and POST with a deadline
//!
//! # Design Decisions
//! - Reset-always: a failed push drops that window instead of retrying
//! - Ticks run inline in one task, so two pushes never overlap
//! - Exits on the shutdown broadcast; nothing else keeps it alive

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::aggregator::MetricsAggregator;
use super::export::{encode, metric_points};
use crate::config::{Environment, MetricsConfig, WireFormat};
use crate::observability::delivery::{DeliveryClient, DeliveryError};
use crate::observability::system::SystemSampler;
use crate::observability::unix_nanos;

/// Result of one push cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Push disabled; the window was discarded.
    Skipped,
    /// Backend accepted the payload.
    Delivered,
    /// Delivery failed; the window was discarded.
    Failed,
}

struct PushTarget {
    url: String,
    authorization: String,
    client: DeliveryClient,
}

/// Snapshots the aggregator and pushes it on a fixed interval.
pub struct MetricsPublisher {
    aggregator: Arc<MetricsAggregator>,
    sampler: SystemSampler,
    target: Option<PushTarget>,
    format: WireFormat,
    source: String,
    interval: Duration,
}

impl MetricsPublisher {
    /// Build a publisher. Push is disabled when credentials are missing or
    /// the environment is `test`.
    pub fn new(
        config: &MetricsConfig,
        environment: Environment,
        aggregator: Arc<MetricsAggregator>,
        sampler: SystemSampler,
    ) -> Result<Self, DeliveryError> {
        let target = match config.credentials() {
            Some((url, key)) if environment != Environment::Test => Some(PushTarget {
                url: url.to_string(),
                authorization: authorization(config.format, key),
                client: DeliveryClient::new(Duration::from_millis(config.timeout_ms))?,
            }),
            _ => None,
        };

        Ok(Self {
            aggregator,
            sampler,
            target,
            format: config.format,
            source: config.source.clone(),
            interval: Duration::from_millis(config.interval_ms.max(1)),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Run one push cycle. Never returns an error; failures are logged.
    pub async fn tick(&mut self) -> PushOutcome {
        let snapshot = self.aggregator.snapshot_and_reset();

        let Some(target) = &self.target else {
            tracing::trace!(
                requests = snapshot.counters.requests_total,
                "Metrics push disabled, window discarded"
            );
            return PushOutcome::Skipped;
        };

        let system = self.sampler.sample();
        let points = metric_points(&snapshot, &system);
        let encoded = match encode(self.format, &points, &self.source, unix_nanos() as u64) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode metrics");
                return PushOutcome::Failed;
            }
        };

        match target
            .client
            .post(&target.url, &target.authorization, encoded.content_type, encoded.body)
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    requests = snapshot.counters.requests_total,
                    cpu = %system.cpu,
                    mem = %system.mem,
                    "Metrics pushed"
                );
                PushOutcome::Delivered
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %target.url, "Metrics push failed");
                PushOutcome::Failed
            }
        }
    }

    /// Tick until the shutdown signal fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            enabled = self.is_enabled(),
            format = ?self.format,
            "Metrics publisher starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Metrics publisher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

fn authorization(format: WireFormat, api_key: &str) -> String {
    match format {
        WireFormat::Otlp => format!("Basic {}", STANDARD.encode(api_key.trim())),
        WireFormat::Prometheus => format!("Bearer {}", api_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn enabled_config() -> MetricsConfig {
        MetricsConfig {
            url: Some("http://127.0.0.1:9/push".into()),
            api_key: Some("id:key".into()),
            timeout_ms: 300,
            ..MetricsConfig::default()
        }
    }

    #[test]
    fn authorization_per_format() {
        assert_eq!(authorization(WireFormat::Otlp, " id:key "), "Basic aWQ6a2V5");
        assert_eq!(authorization(WireFormat::Prometheus, "tok"), "Bearer tok");
    }

    #[test]
    fn test_environment_disables_push() {
        let aggregator = Arc::new(MetricsAggregator::new());
        let publisher = MetricsPublisher::new(
            &enabled_config(),
            Environment::Test,
            aggregator,
            SystemSampler::default(),
        )
        .unwrap();
        assert!(!publisher.is_enabled());
    }

    #[tokio::test]
    async fn disabled_tick_resets_without_io() {
        let aggregator = Arc::new(MetricsAggregator::new());
        aggregator.track_request(&Method::GET, Duration::from_millis(2));
        aggregator.record_pizza(true, 5.0, 3.0);

        let mut publisher = MetricsPublisher::new(
            &MetricsConfig::default(),
            Environment::Production,
            aggregator.clone(),
            SystemSampler::default(),
        )
        .unwrap();

        assert_eq!(publisher.tick().await, PushOutcome::Skipped);
        let after = aggregator.snapshot();
        assert_eq!(after.counters.requests_total, 0);
        assert_eq!(after.revenue, 0.0);
        assert_eq!(after.latency_samples, 0);
    }

    #[tokio::test]
    async fn failed_push_still_resets() {
        let aggregator = Arc::new(MetricsAggregator::new());
        aggregator.record_auth(true);

        let mut publisher = MetricsPublisher::new(
            &enabled_config(),
            Environment::Production,
            aggregator.clone(),
            SystemSampler::default(),
        )
        .unwrap();

        assert_eq!(publisher.tick().await, PushOutcome::Failed);
        assert_eq!(aggregator.snapshot().counters.auth_success, 0);
    }

    #[tokio::test]
    async fn run_exits_on_shutdown() {
        let aggregator = Arc::new(MetricsAggregator::new());
        let publisher = MetricsPublisher::new(
            &MetricsConfig::default(),
            Environment::Production,
            aggregator,
            SystemSampler::default(),
        )
        .unwrap();

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(publisher.run(rx));
        tx.send(()).unwrap();

        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("publisher did not stop")
            .unwrap();
    }
}
