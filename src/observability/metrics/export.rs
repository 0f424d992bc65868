//! Wire encodings for metrics pushes.
//!
//! A snapshot plus a system sample is flattened into [`MetricPoint`]s once,
//! then rendered as either an OTLP/JSON metric stream or Prometheus
//! exposition text.

use std::fmt::Write;

use serde::Serialize;

use super::aggregator::MetricsSnapshot;
use crate::config::WireFormat;
use crate::observability::system::SystemSample;

const CUMULATIVE: &str = "AGGREGATION_TEMPORALITY_CUMULATIVE";

/// Whether a point is a monotonic counter or a point-in-time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Sum,
    Gauge,
}

/// One named value ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: MetricKind,
    pub value: f64,
}

impl MetricPoint {
    fn sum(name: &'static str, unit: &'static str, value: f64) -> Self {
        Self { name, unit, kind: MetricKind::Sum, value }
    }

    fn gauge(name: &'static str, unit: &'static str, value: f64) -> Self {
        Self { name, unit, kind: MetricKind::Gauge, value }
    }
}

/// Flatten a window snapshot and host sample into the pushed metric set.
pub fn metric_points(snapshot: &MetricsSnapshot, system: &SystemSample) -> Vec<MetricPoint> {
    let c = &snapshot.counters;
    vec![
        MetricPoint::sum("http_requests_total", "1", c.requests_total as f64),
        MetricPoint::sum("http_requests_get", "1", c.requests_get as f64),
        MetricPoint::sum("http_requests_post", "1", c.requests_post as f64),
        MetricPoint::sum("http_requests_put", "1", c.requests_put as f64),
        MetricPoint::sum("http_requests_delete", "1", c.requests_delete as f64),
        MetricPoint::sum("auth_success_total", "1", c.auth_success as f64),
        MetricPoint::sum("auth_fail_total", "1", c.auth_fail as f64),
        MetricPoint::sum("pizza_sold_total", "1", c.pizza_sold as f64),
        MetricPoint::sum("pizza_failed_total", "1", c.pizza_failed as f64),
        MetricPoint::sum("pizza_revenue_total", "usd", snapshot.revenue),
        MetricPoint::gauge("latency_avg_ms", "ms", snapshot.latency_avg_ms),
        MetricPoint::gauge("pizza_revenue_per_minute", "usd/min", snapshot.revenue_per_minute()),
        MetricPoint::gauge("system_cpu_percent", "%", system.cpu.value()),
        MetricPoint::gauge("system_mem_percent", "%", system.mem.value()),
        MetricPoint::gauge("active_users", "1", snapshot.active_users as f64),
    ]
}

/// An encoded request body plus its content type.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMetrics {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Encode `points` in the configured wire format.
pub fn encode(
    format: WireFormat,
    points: &[MetricPoint],
    source: &str,
    time_unix_nano: u64,
) -> Result<EncodedMetrics, serde_json::Error> {
    match format {
        WireFormat::Otlp => Ok(EncodedMetrics {
            content_type: "application/json",
            body: serde_json::to_vec(&otlp_payload(points, source, time_unix_nano))?,
        }),
        WireFormat::Prometheus => Ok(EncodedMetrics {
            content_type: "text/plain",
            body: exposition_text(points, source).into_bytes(),
        }),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtlpPayload<'a> {
    resource_metrics: Vec<ResourceMetrics<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceMetrics<'a> {
    scope_metrics: Vec<ScopeMetrics<'a>>,
}

#[derive(Debug, Serialize)]
struct ScopeMetrics<'a> {
    metrics: Vec<OtlpMetric<'a>>,
}

#[derive(Debug, Serialize)]
struct OtlpMetric<'a> {
    name: &'static str,
    unit: &'static str,
    #[serde(flatten)]
    data: OtlpData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum OtlpData<'a> {
    Sum(OtlpSum<'a>),
    Gauge(OtlpGauge<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OtlpSum<'a> {
    aggregation_temporality: &'static str,
    is_monotonic: bool,
    data_points: Vec<DataPoint<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OtlpGauge<'a> {
    data_points: Vec<DataPoint<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DataPoint<'a> {
    as_double: f64,
    time_unix_nano: u64,
    attributes: [Attribute<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Attribute<'a> {
    key: &'static str,
    value: AttributeValue<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttributeValue<'a> {
    string_value: &'a str,
}

/// Build the OTLP/JSON metric stream body.
pub fn otlp_payload<'a>(points: &[MetricPoint], source: &'a str, time_unix_nano: u64) -> OtlpPayload<'a> {
    let metrics = points
        .iter()
        .map(|p| {
            let data_points = vec![DataPoint {
                as_double: p.value,
                time_unix_nano,
                attributes: [Attribute {
                    key: "source",
                    value: AttributeValue { string_value: source },
                }],
            }];
            let data = match p.kind {
                MetricKind::Sum => OtlpData::Sum(OtlpSum {
                    aggregation_temporality: CUMULATIVE,
                    is_monotonic: true,
                    data_points,
                }),
                MetricKind::Gauge => OtlpData::Gauge(OtlpGauge { data_points }),
            };
            OtlpMetric { name: p.name, unit: p.unit, data }
        })
        .collect();

    OtlpPayload {
        resource_metrics: vec![ResourceMetrics {
            scope_metrics: vec![ScopeMetrics { metrics }],
        }],
    }
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Render `name{source="..."} value` lines, newline-joined.
pub fn exposition_text(points: &[MetricPoint], source: &str) -> String {
    let source = escape_label(source);
    let mut out = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}{{source=\"{}\"}} {}", p.name, source, p.value);
    }
    out
}
