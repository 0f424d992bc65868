//! Metrics publisher against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pizza_telemetry::config::{Environment, WireFormat};
use pizza_telemetry::observability::{MetricsAggregator, MetricsPublisher, PushOutcome};
use pizza_telemetry::Shutdown;

mod common;

fn seeded() -> Arc<MetricsAggregator> {
    let aggregator = Arc::new(MetricsAggregator::new());
    aggregator.track_request(&Method::GET, Duration::from_millis(10));
    aggregator.track_request(&Method::POST, Duration::from_millis(30));
    aggregator.record_auth(true);
    aggregator.record_auth(false);
    aggregator.record_pizza(true, 20.0, 0.05);
    aggregator
}

fn metric<'a>(body: &'a Value, name: &str) -> &'a Value {
    body["resourceMetrics"][0]["scopeMetrics"][0]["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == name)
        .unwrap_or_else(|| panic!("metric {name} missing"))
}

#[tokio::test]
async fn otlp_push_uses_basic_auth_and_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/otlp"))
        .and(header("authorization", "Basic aWQ6a2V5"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let aggregator = seeded();
    let config = common::metrics_config(format!("{}/otlp", server.uri()), WireFormat::Otlp);
    let mut publisher = MetricsPublisher::new(
        &config,
        Environment::Production,
        aggregator.clone(),
        common::fixed_sampler(),
    )
    .unwrap();

    assert_eq!(publisher.tick().await, PushOutcome::Delivered);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    let total = metric(&body, "http_requests_total");
    assert_eq!(total["sum"]["dataPoints"][0]["asDouble"], 2.0);
    assert_eq!(total["sum"]["isMonotonic"], true);
    assert_eq!(
        total["sum"]["dataPoints"][0]["attributes"][0]["value"]["stringValue"],
        "pizza-test"
    );
    assert_eq!(metric(&body, "auth_fail_total")["sum"]["dataPoints"][0]["asDouble"], 1.0);
    let latency = metric(&body, "latency_avg_ms")["gauge"]["dataPoints"][0]["asDouble"]
        .as_f64()
        .unwrap();
    assert!((latency - 20.0).abs() < 1e-6);
    assert_eq!(metric(&body, "system_cpu_percent")["gauge"]["dataPoints"][0]["asDouble"], 25.0);
    assert_eq!(metric(&body, "system_mem_percent")["gauge"]["dataPoints"][0]["asDouble"], 60.0);

    // Window was consumed by the push.
    assert_eq!(aggregator.snapshot().counters.requests_total, 0);
}

#[tokio::test]
async fn prometheus_push_uses_bearer_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/metrics"))
        .and(header("authorization", "Bearer id:key"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = common::metrics_config(format!("{}/metrics", server.uri()), WireFormat::Prometheus);
    let mut publisher =
        MetricsPublisher::new(&config, Environment::Production, seeded(), common::fixed_sampler())
            .unwrap();

    assert_eq!(publisher.tick().await, PushOutcome::Delivered);

    let requests = server.received_requests().await.unwrap();
    let text = String::from_utf8(requests[0].body.clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines.contains(&"http_requests_total{source=\"pizza-test\"} 2"));
    assert!(lines.contains(&"pizza_sold_total{source=\"pizza-test\"} 1"));
    assert!(lines.contains(&"system_cpu_percent{source=\"pizza-test\"} 25"));
}

#[tokio::test]
async fn failed_push_still_resets_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let aggregator = seeded();
    let config = common::metrics_config(server.uri(), WireFormat::Otlp);
    let mut publisher = MetricsPublisher::new(
        &config,
        Environment::Production,
        aggregator.clone(),
        common::fixed_sampler(),
    )
    .unwrap();

    assert_eq!(publisher.tick().await, PushOutcome::Failed);

    let snapshot = aggregator.snapshot();
    assert_eq!(snapshot.counters.requests_total, 0);
    assert_eq!(snapshot.revenue, 0.0);
    assert_eq!(snapshot.latency_samples, 0);
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = common::metrics_config(server.uri(), WireFormat::Otlp);
    let mut publisher =
        MetricsPublisher::new(&config, Environment::Production, seeded(), common::fixed_sampler())
            .unwrap();

    assert_eq!(publisher.tick().await, PushOutcome::Failed);
}

#[tokio::test]
async fn run_pushes_on_interval_until_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = common::metrics_config(server.uri(), WireFormat::Otlp);
    let publisher =
        MetricsPublisher::new(&config, Environment::Production, seeded(), common::fixed_sampler())
            .unwrap();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(publisher.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("publisher did not stop")
        .unwrap();

    let pushes = server.received_requests().await.unwrap().len();
    assert!(pushes >= 2, "expected several pushes, got {pushes}");
}
