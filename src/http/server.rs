//! Standalone HTTP server.
//!
//! # Responsibilities
//! - Build the axum router (`/health`)
//! - Wire up telemetry middleware, tracing and request IDs
//! - Serve until the shutdown future resolves

use std::future::Future;

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::observability::Telemetry;

pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(telemetry: &Telemetry) -> Self {
        Self {
            router: Self::build_router(telemetry),
        }
    }

    /// Request IDs are assigned outermost so both telemetry middlewares
    /// and the trace span see them.
    fn build_router(telemetry: &Telemetry) -> Router {
        let routes = Router::new().route("/health", get(health_handler));
        telemetry.attach(routes).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, TelemetryConfig};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_tracked_and_tagged() {
        let config = TelemetryConfig {
            environment: Environment::Test,
            ..TelemetryConfig::default()
        };
        let telemetry = Telemetry::start(&config).unwrap();
        let server = HttpServer::new(&telemetry);

        let response = server
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(telemetry.metrics().snapshot().counters.requests_get, 1);

        telemetry.shutdown().await;
    }
}
