//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every API request produces one RequestMetricEvent:
//!     → metrics.rs (local Prometheus counters + histogram)
//!     → logging.rs (structured log line with request details)
//!     → push.rs (queued copies for the remote metrics and log backends)
//!
//! Consumers:
//!     → GET /api/metrics (Prometheus scrape)
//!     → stdout (pretty or JSON)
//!     → Grafana Cloud OTLP gateway / Loki, when configured
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every log line
//! - Metrics are cheap (atomic increments)
//! - Remote delivery never blocks or fails a request

pub mod logging;
pub mod metrics;
pub mod push;

use serde_json::Value;

use crate::http::request::RequestDetails;
use self::logging::{LogEvent, LogLevel};
use self::metrics::RequestMetricEvent;
use self::push::PushDispatcher;

/// Entry point handlers use to report what happened.
#[derive(Clone, Debug)]
pub struct Telemetry {
    push: PushDispatcher,
}

impl Telemetry {
    pub fn new(push: PushDispatcher) -> Self {
        Self { push }
    }

    /// Local metrics and logs only.
    pub fn local_only() -> Self {
        Self::new(PushDispatcher::disabled())
    }

    /// Record a finished request in the registry and mirror it remotely.
    pub fn record_request(&self, event: &RequestMetricEvent) {
        metrics::record_request(event);
        for point in metrics::remote_points(event) {
            self.push.push_metric(point);
        }
    }

    /// Emit the per-request log line.
    pub fn api_request(
        &self,
        event: &RequestMetricEvent,
        display_route: &str,
        details: &RequestDetails,
    ) {
        let log = logging::api_request_event(event, display_route, details);
        logging::emit_api_request(event, &log, details);
        self.push.push_log(log);
    }

    /// Emit a free-form log line locally and remotely.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        let event = LogEvent::new(level, message, metadata);
        event.emit();
        self.push.push_log(event);
    }
}
