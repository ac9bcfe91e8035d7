//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Build structured log events for API requests
//! - Emit events locally before they are mirrored to the remote sink
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` wins over the configured level

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::http::request::RequestDetails;
use crate::observability::metrics::RequestMetricEvent;

/// Initialize the global tracing subscriber.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// A structured log record, emitted locally and pushed remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: LogLevel,
    pub message: String,
    pub metadata: Map<String, Value>,
    /// Extra stream labels for the remote sink.
    pub labels: BTreeMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>, metadata: Value) -> Self {
        let metadata = match metadata {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        Self {
            level,
            message: message.into(),
            metadata,
            labels: BTreeMap::new(),
        }
    }

    /// Write the event to the local subscriber.
    pub fn emit(&self) {
        let metadata = Value::Object(self.metadata.clone());
        match self.level {
            LogLevel::Debug => tracing::debug!(metadata = %metadata, "{}", self.message),
            LogLevel::Info => tracing::info!(metadata = %metadata, "{}", self.message),
            LogLevel::Warn => tracing::warn!(metadata = %metadata, "{}", self.message),
            LogLevel::Error => tracing::error!(metadata = %metadata, "{}", self.message),
        }
    }
}

/// Build the per-request log line.
///
/// `display_route` is the concrete path including the raw country segment.
pub fn api_request_event(
    event: &RequestMetricEvent,
    display_route: &str,
    details: &RequestDetails,
) -> LogEvent {
    let mut metadata = Map::new();
    metadata.insert("method".into(), Value::from(event.method.clone()));
    metadata.insert("route".into(), Value::from(display_route));
    metadata.insert("country".into(), Value::from(event.country.clone()));
    metadata.insert("statusCode".into(), Value::from(event.status_code));
    metadata.insert("duration".into(), Value::from(event.duration_secs));
    metadata.insert(
        "durationMs".into(),
        Value::from((event.duration_secs * 1000.0).round() as u64),
    );
    metadata.insert(
        "timestamp".into(),
        Value::from(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
    );
    if let Some(kind) = event.error_kind {
        metadata.insert("errorKind".into(), Value::from(kind));
    }
    if let Ok(Value::Object(request)) = serde_json::to_value(details) {
        metadata.extend(request);
    }

    let mut labels = BTreeMap::new();
    labels.insert("route".to_string(), display_route.to_string());
    labels.insert("country".to_string(), event.country.clone());
    labels.insert("status_code".to_string(), event.status_code.to_string());
    labels.insert("ip".to_string(), details.ip.clone());

    LogEvent {
        level: LogLevel::Info,
        message: format!("API Request: {} {}", event.method, display_route),
        metadata,
        labels,
    }
}

/// Emit the per-request line with first-class tracing fields.
pub fn emit_api_request(event: &RequestMetricEvent, log: &LogEvent, details: &RequestDetails) {
    tracing::info!(
        request_id = %details.request_id,
        method = %event.method,
        route = event.route,
        country = %event.country,
        status_code = event.status_code,
        duration_ms = (event.duration_secs * 1000.0),
        error_kind = event.error_kind,
        ip = %details.ip,
        user_agent = details.user_agent.as_deref(),
        "{}",
        log.message
    );
}

/// Flatten an error and its sources into one line per cause.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}
