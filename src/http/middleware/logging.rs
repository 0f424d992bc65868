//! Request/response logging middleware.
//!
//! Buffers the request body (when small and of known length), lets the
//! handler run, then wraps the response so the body can be observed as it
//! streams. The log record is built when the body completes.

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use http_body::{Body as HttpBody, Frame};
use serde_json::Value;

use crate::http::capture::{CompletionGuard, ObservedBody};
use crate::observability::logs::{HttpExchange, RequestLogger};

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

pub async fn log_requests(
    State(logger): State<Arc<RequestLogger>>,
    request: Request,
    next: Next,
) -> Response {
    if !logger.is_enabled() {
        return next.run(request).await;
    }

    let started = Instant::now();
    let limit = logger.max_body_bytes();
    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let has_auth_header = request.headers().contains_key(AUTHORIZATION);
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let (request, request_body) = buffer_request(request, limit).await;

    // Stays 0 if the handler future is dropped before producing a response.
    let status = Arc::new(AtomicU16::new(0));
    let observed_status = status.clone();
    let guard = CompletionGuard::new(move |completion| {
        let status = observed_status.load(Ordering::Acquire);
        let (response_body, response_truncated) = match completion.body {
            Some(captured) => (parse_body(&captured.bytes), captured.truncated),
            None => (Value::Null, false),
        };
        if !completion.completed {
            tracing::debug!(path = %path, status, "Response body not fully sent");
        }
        logger.log_http(HttpExchange {
            method,
            path,
            status,
            duration: started.elapsed(),
            has_auth_header,
            request_id,
            request_body,
            response_body,
            response_truncated,
        });
    });

    let response = next.run(request).await;
    status.store(response.status().as_u16(), Ordering::Release);
    response.map(|body| ObservedBody::wrap(body, Some(limit), guard))
}

/// Read the request body when its length is known and within `limit`.
/// Anything else is passed through untouched and logged as `null`.
///
/// A body that fails while being read is logged as `null`; the handler
/// gets a body that fails with the same error.
async fn buffer_request(request: Request, limit: usize) -> (Request, Value) {
    let fits = request
        .body()
        .size_hint()
        .upper()
        .is_some_and(|len| len <= limit as u64);
    if !fits {
        return (request, Value::Null);
    }

    let (parts, body) = request.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => {
            let value = parse_body(&bytes);
            (Request::from_parts(parts, Body::from(bytes)), value)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body, forwarding the error");
            let body = Body::new(FailedBody { error: Some(e) });
            (Request::from_parts(parts, body), Value::Null)
        }
    }
}

/// Yields one stored error, then ends.
struct FailedBody {
    error: Option<axum::Error>,
}

impl HttpBody for FailedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(self.get_mut().error.take().map(Err))
    }

    fn is_end_stream(&self) -> bool {
        self.error.is_none()
    }
}

/// JSON when it parses, text otherwise; empty bodies are `null`.
pub fn parse_body(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_body_variants() {
        assert_eq!(parse_body(&Bytes::new()), Value::Null);
        assert_eq!(parse_body(&Bytes::from_static(b"{\"a\":1}")), json!({"a": 1}));
        assert_eq!(
            parse_body(&Bytes::from_static(b"<html>oops</html>")),
            json!("<html>oops</html>")
        );
        assert_eq!(parse_body(&Bytes::from_static(b"{\"cut\":")), json!("{\"cut\":"));
    }

    #[tokio::test]
    async fn small_bodies_are_buffered_and_restored() {
        let request = axum::http::Request::builder()
            .uri("/api/auth")
            .body(Body::from("{\"password\":\"p\"}"))
            .unwrap();
        let (request, value) = buffer_request(request, 1024).await;

        assert_eq!(value, json!({"password": "p"}));
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"{\"password\":\"p\"}");
    }

    #[tokio::test]
    async fn oversized_bodies_pass_through() {
        let request = axum::http::Request::builder()
            .body(Body::from("0123456789"))
            .unwrap();
        let (request, value) = buffer_request(request, 4).await;

        assert_eq!(value, Value::Null);
        let bytes = axum::body::to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.len(), 10);
    }
}
