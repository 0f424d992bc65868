//! Bounded queue and background delivery of log records.
//!
//! # Responsibilities
//! - Accept records from any thread without blocking (`try_send`)
//! - Deliver them one by one from a single tokio task
//! - Drop, never buffer without bound, when the backend falls behind
//!
//! # Design Decisions
//! - A full queue drops the newest record and logs a warning
//! - On shutdown the worker flushes what is queued, bounded by one timeout

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time;

use super::record::LogRecord;
use crate::config::LoggingConfig;
use crate::observability::delivery::{DeliveryClient, DeliveryError};

/// Producer half handed to the [`RequestLogger`](super::RequestLogger).
#[derive(Debug, Clone)]
pub struct LogShipper {
    tx: mpsc::Sender<LogRecord>,
}

impl LogShipper {
    /// Create a shipper and the queue receiver a worker drains.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LogRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queue a record. Returns `false` if it was dropped.
    pub fn enqueue(&self, record: LogRecord) -> bool {
        match self.tx.try_send(record) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(record)) => {
                tracing::warn!(
                    kind = record.kind().as_str(),
                    level = record.level().as_str(),
                    "Log queue full, dropping record"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Log shipper stopped, dropping record");
                false
            }
        }
    }
}

/// Consumer half: POSTs queued records to the log backend.
pub struct ShipperWorker {
    rx: mpsc::Receiver<LogRecord>,
    client: DeliveryClient,
    url: String,
    authorization: String,
    source: String,
}

impl ShipperWorker {
    /// Returns `None` when the config lacks url, user id or api key.
    pub fn new(
        config: &LoggingConfig,
        rx: mpsc::Receiver<LogRecord>,
    ) -> Result<Option<Self>, DeliveryError> {
        if !config.is_complete() {
            return Ok(None);
        }
        let (Some(url), Some(user_id), Some(api_key)) =
            (&config.url, &config.user_id, &config.api_key)
        else {
            return Ok(None);
        };

        Ok(Some(Self {
            rx,
            client: DeliveryClient::new(Duration::from_millis(config.timeout_ms))?,
            url: url.trim().to_string(),
            authorization: format!("Bearer {}:{}", user_id.trim(), api_key.trim()),
            source: config.source.clone(),
        }))
    }

    /// Deliver one record.
    pub async fn deliver(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        let body = record.to_push_body(&self.source)?;
        self.client
            .post(&self.url, &self.authorization, "application/json", body)
            .await
    }

    async fn deliver_logged(&self, record: LogRecord) {
        if let Err(e) = self.deliver(&record).await {
            tracing::warn!(
                error = %e,
                kind = record.kind().as_str(),
                "Failed to send log"
            );
        }
    }

    /// Drain the queue until shutdown or until every shipper is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(url = %self.url, "Log shipper starting");

        loop {
            tokio::select! {
                next = self.rx.recv() => match next {
                    Some(record) => self.deliver_logged(record).await,
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Log shipper received shutdown signal, flushing queue");
                    let deadline = self.client.timeout();
                    if time::timeout(deadline, self.flush()).await.is_err() {
                        tracing::warn!("Log flush timed out, remaining records dropped");
                    }
                    break;
                }
            }
        }
    }

    async fn flush(&mut self) {
        self.rx.close();
        while let Some(record) = self.rx.recv().await {
            self.deliver_logged(record).await;
        }
    }
}
