//! Telemetry service object.
//!
//! Constructed once at startup. Owns the metrics aggregator, the request
//! logger and the two background tasks (metrics publisher, log shipper),
//! and hands out `Arc` handles to route handlers and middleware.

use std::mem;
use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use thiserror::Error;
use tokio::task::JoinHandle;

use super::delivery::DeliveryError;
use super::logs::{LogShipper, RequestLogger, ShipperWorker};
use super::metrics::{MetricsAggregator, MetricsPublisher};
use super::system::SystemSampler;
use crate::config::TelemetryConfig;
use crate::http::middleware::{log_requests, track_requests};
use crate::lifecycle::Shutdown;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build delivery client: {0}")]
    Delivery(#[from] DeliveryError),
}

pub struct Telemetry {
    metrics: Arc<MetricsAggregator>,
    logger: Arc<RequestLogger>,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
}

impl Telemetry {
    /// Start the pipeline with the host's real CPU and memory readings.
    /// Must be called inside a tokio runtime.
    pub fn start(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        Self::start_with_sampler(config, SystemSampler::default())
    }

    pub fn start_with_sampler(
        config: &TelemetryConfig,
        sampler: SystemSampler,
    ) -> Result<Self, TelemetryError> {
        let shutdown = Shutdown::new();
        let metrics = Arc::new(MetricsAggregator::new());
        let mut tasks = Vec::with_capacity(2);

        let publisher =
            MetricsPublisher::new(&config.metrics, config.environment, metrics.clone(), sampler)?;
        tasks.push(tokio::spawn(publisher.run(shutdown.subscribe())));

        let (shipper, rx) = LogShipper::channel(config.logging.queue_capacity);
        let logger = match ShipperWorker::new(&config.logging, rx)? {
            Some(worker) => {
                tasks.push(tokio::spawn(worker.run(shutdown.subscribe())));
                RequestLogger::new(shipper, config.logging.max_body_bytes)
            }
            None => {
                tracing::info!("Remote logging not configured, log records are dropped");
                RequestLogger::disabled()
            }
        };

        Ok(Self {
            metrics,
            logger: Arc::new(logger),
            shutdown,
            tasks,
        })
    }

    /// Handle for `record_auth`, `record_pizza` and `record_active_user`.
    pub fn metrics(&self) -> Arc<MetricsAggregator> {
        self.metrics.clone()
    }

    /// Handle for `log_query`, `log_factory_call` and `log_error`.
    pub fn logger(&self) -> Arc<RequestLogger> {
        self.logger.clone()
    }

    /// Install both middlewares on `router`. Routes added after this call
    /// are not observed.
    pub fn attach<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(from_fn_with_state(self.logger.clone(), log_requests))
            .layer(from_fn_with_state(self.metrics.clone(), track_requests))
    }

    /// Stop the background tasks and wait for them to exit. The log
    /// shipper flushes its queue first, bounded by its delivery timeout.
    pub async fn shutdown(mut self) {
        self.shutdown.trigger();
        for task in mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Telemetry task panicked");
            }
        }
        tracing::info!("Telemetry stopped");
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::observability::system::{HostProbe, HostReading};

    struct Idle;

    impl HostProbe for Idle {
        fn read(&mut self) -> HostReading {
            HostReading {
                load_one: 0.0,
                logical_cores: 1,
                total_memory: 1,
                free_memory: 1,
            }
        }
    }

    #[tokio::test]
    async fn unconfigured_pipeline_starts_and_stops() {
        let config = TelemetryConfig {
            environment: Environment::Test,
            ..TelemetryConfig::default()
        };
        let telemetry = Telemetry::start_with_sampler(&config, SystemSampler::new(Box::new(Idle)))
            .unwrap();

        assert!(!telemetry.logger().is_enabled());
        telemetry.metrics().record_auth(true);
        assert_eq!(telemetry.metrics().snapshot().counters.auth_success, 1);

        telemetry.shutdown().await;
    }

    #[tokio::test]
    async fn configured_logging_spawns_shipper() {
        let mut config = TelemetryConfig::default();
        config.environment = Environment::Test;
        config.logging.url = Some("http://127.0.0.1:9/loki/api/v1/push".into());
        config.logging.user_id = Some("1".into());
        config.logging.api_key = Some("k".into());

        let telemetry = Telemetry::start_with_sampler(&config, SystemSampler::new(Box::new(Idle)))
            .unwrap();
        assert!(telemetry.logger().is_enabled());
        assert_eq!(telemetry.tasks.len(), 2);

        telemetry.shutdown().await;
    }
}
