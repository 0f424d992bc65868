//! HTTP delivery to remote telemetry backends.
//!
//! Both the metrics publisher and the log shipper POST through
//! [`DeliveryClient`]. Every call carries a deadline; failures come back as
//! [`DeliveryError`] for the caller to log and drop.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use thiserror::Error;

/// Why a push did not reach the backend.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to build client: {0}")]
    Client(#[source] reqwest::Error),
}

/// POSTs payloads with a fixed timeout.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl DeliveryClient {
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DeliveryError::Client)?;
        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `body` to `url` with the given content type and Authorization value.
    pub async fn post(
        &self,
        url: &str,
        authorization: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(AUTHORIZATION, authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Status {
            status: status.as_u16(),
            body: truncate(body, 256),
        })
    }

    fn classify(&self, err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            DeliveryError::Timeout(self.timeout)
        } else {
            DeliveryError::Transport(err)
        }
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}
