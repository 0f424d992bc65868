//! Request-tracking middleware.
//! Counts every request and records its full lifecycle duration.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::capture::{CompletionGuard, ObservedBody};
use crate::observability::metrics::MetricsAggregator;

/// Record the request once its response body finishes, errors, or is
/// dropped. A handler future dropped mid-flight is recorded too.
pub async fn track_requests(
    State(metrics): State<Arc<MetricsAggregator>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let guard = CompletionGuard::new(move |_| {
        metrics.track_request(&method, started.elapsed());
    });

    let response = next.run(request).await;
    response.map(|body| ObservedBody::wrap(body, None, guard))
}
