//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Install the process-wide Prometheus recorder once
//! - Record per-request counters and latency histograms
//! - Describe the points mirrored to the remote metrics backend
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route, status, country
//! - `http_request_duration_seconds` (histogram): latency by method, route, status
//! - `api_calls_by_country_total` (counter): successful calls by country, endpoint
//! - `api_errors_total` (counter): failed calls by route, error type
//! - `process_*`: CPU, memory, open file descriptors and start time of this
//!   process, refreshed on every scrape
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic handles from the `metrics` crate)
//! - Counters only grow; they reset on process restart
//! - Histogram buckets tuned for in-memory lookups

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use tokio::sync::broadcast;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const API_CALLS_BY_COUNTRY_TOTAL: &str = "api_calls_by_country_total";
pub const API_ERRORS_TOTAL: &str = "api_errors_total";

/// Name used for the per-country counter on the remote backend.
pub const REMOTE_API_CALLS_BY_COUNTRY: &str = "api_calls_by_country";

/// Content type of the text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.015, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0];

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
static PROCESS: OnceLock<Collector> = OnceLock::new();

/// One completed API request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMetricEvent {
    pub method: String,
    /// Route template without the country segment, e.g. `/api/currency`.
    pub route: &'static str,
    /// Short endpoint name, e.g. `currency`.
    pub endpoint: &'static str,
    pub status_code: u16,
    /// Normalized country key.
    pub country: String,
    pub duration_secs: f64,
    /// Error code for failed requests, `None` on success.
    pub error_kind: Option<&'static str>,
}

impl RequestMetricEvent {
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none()
    }
}

/// Install the global Prometheus recorder.
///
/// Safe to call repeatedly; only the first call installs. Returns `None` when
/// installation failed (another recorder already owns the global slot), in
/// which case metric updates are dropped and the scrape endpoint reports an
/// error.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| {
            let installed = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
                    DURATION_BUCKETS,
                )
                .and_then(|builder| builder.install_recorder());

            match installed {
                Ok(handle) => {
                    describe_metrics();
                    process_collector().describe();
                    tracing::info!("Prometheus recorder installed");
                    Some(handle)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install Prometheus recorder");
                    None
                }
            }
        })
        .clone()
}

fn describe_metrics() {
    describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests");
    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of HTTP requests in seconds"
    );
    describe_counter!(API_CALLS_BY_COUNTRY_TOTAL, "Total API calls per country");
    describe_counter!(API_ERRORS_TOTAL, "Total number of API errors");
}

fn process_collector() -> &'static Collector {
    PROCESS.get_or_init(Collector::default)
}

/// Refresh the `process_*` gauges from the OS.
pub fn collect_process_metrics() {
    process_collector().collect();
}

/// Periodically compact histogram storage until shutdown.
pub fn spawn_upkeep(handle: PrometheusHandle, mut shutdown: broadcast::Receiver<()>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = ticker.tick() => handle.run_upkeep(),
                _ = shutdown.recv() => break,
            }
        }
    });
}

/// Record a completed request in the local registry.
pub fn record_request(event: &RequestMetricEvent) {
    let status = event.status_code.to_string();

    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => event.method.clone(),
        "route" => event.route,
        "status_code" => status.clone(),
        "country" => event.country.clone()
    )
    .increment(1);

    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => event.method.clone(),
        "route" => event.route,
        "status_code" => status
    )
    .record(event.duration_secs);

    match event.error_kind {
        Some(kind) => {
            counter!(API_ERRORS_TOTAL, "route" => event.route, "error_type" => kind).increment(1)
        }
        None => counter!(
            API_CALLS_BY_COUNTRY_TOTAL,
            "country" => event.country.clone(),
            "endpoint" => event.endpoint
        )
        .increment(1),
    }
}

/// How a remote point is aggregated by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

/// A single observation mirrored to the remote metrics backend.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub name: &'static str,
    pub value: f64,
    pub kind: MetricKind,
    pub labels: Vec<(&'static str, String)>,
}

/// The remote copies of a request's measurements.
pub fn remote_points(event: &RequestMetricEvent) -> Vec<MetricPoint> {
    let status = event.status_code.to_string();
    let mut points = vec![
        MetricPoint {
            name: HTTP_REQUESTS_TOTAL,
            value: 1.0,
            kind: MetricKind::Counter,
            labels: vec![
                ("method", event.method.clone()),
                ("route", event.route.to_string()),
                ("status_code", status.clone()),
                ("country", event.country.clone()),
            ],
        },
        MetricPoint {
            name: HTTP_REQUEST_DURATION_SECONDS,
            value: event.duration_secs,
            kind: MetricKind::Gauge,
            labels: vec![
                ("method", event.method.clone()),
                ("route", event.route.to_string()),
                ("status_code", status),
            ],
        },
    ];

    if event.is_success() {
        points.push(MetricPoint {
            name: REMOTE_API_CALLS_BY_COUNTRY,
            value: 1.0,
            kind: MetricKind::Counter,
            labels: vec![
                ("country", event.country.clone()),
                ("endpoint", event.route.to_string()),
            ],
        });
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(error_kind: Option<&'static str>) -> RequestMetricEvent {
        RequestMetricEvent {
            method: "GET".into(),
            route: "/api/capital",
            endpoint: "capital",
            status_code: if error_kind.is_some() { 404 } else { 200 },
            country: "metrics unit test".into(),
            duration_secs: 0.002,
            error_kind,
        }
    }

    fn counter_value(rendered: &str, name: &str, labels: &[&str]) -> Option<u64> {
        rendered
            .lines()
            .filter(|line| line.starts_with(&format!("{}{{", name)))
            .find(|line| labels.iter().all(|l| line.contains(l)))
            .and_then(|line| line.rsplit(' ').next())
            .and_then(|v| v.parse().ok())
    }

    #[test]
    fn test_remote_points_on_success() {
        let points = remote_points(&event(None));
        let names: Vec<&str> = points.iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS, REMOTE_API_CALLS_BY_COUNTRY]
        );
        assert_eq!(points[1].kind, MetricKind::Gauge);
        assert_eq!(points[1].value, 0.002);
    }

    #[test]
    fn test_remote_points_on_failure_skip_country_counter() {
        let points = remote_points(&event(Some("not_found")));
        assert_eq!(points.len(), 2);
        assert!(points[0].labels.contains(&("status_code", "404".to_string())));
    }

    #[test]
    fn test_record_request_counts() {
        let handle = init_metrics().expect("recorder installed");

        for _ in 0..3 {
            record_request(&event(Some("not_found")));
        }
        record_request(&event(None));

        let rendered = handle.render();
        let labels = [
            "route=\"/api/capital\"",
            "country=\"metrics unit test\"",
            "status_code=\"404\"",
        ];
        assert_eq!(counter_value(&rendered, HTTP_REQUESTS_TOTAL, &labels), Some(3));
        assert_eq!(
            counter_value(
                &rendered,
                API_CALLS_BY_COUNTRY_TOTAL,
                &["country=\"metrics unit test\"", "endpoint=\"capital\""]
            ),
            Some(1)
        );
        assert!(rendered.contains(HTTP_REQUEST_DURATION_SECONDS));
    }
}
