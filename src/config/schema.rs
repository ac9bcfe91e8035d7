//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the country info service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Remote log sink (Loki push API).
    pub loki: LokiConfig,

    /// Remote metrics sink (Grafana Cloud OTLP gateway).
    pub grafana: GrafanaConfig,

    /// Exchange-rate dependency settings.
    pub exchange: ExchangeConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Console log format.
    pub log_format: LogFormat,

    /// Service name attached to every pushed log and metric.
    pub service_name: String,

    /// Deployment environment label.
    pub environment: String,

    /// Capacity of each remote push queue (one per sink). Items are dropped
    /// when it is full.
    pub push_queue_capacity: usize,

    /// Maximum in-flight pushes per sink.
    pub push_concurrency: usize,

    /// Timeout for a single remote push in seconds.
    pub push_timeout_secs: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            service_name: "country-info-api".to_string(),
            environment: "development".to_string(),
            push_queue_capacity: 1024,
            push_concurrency: 16,
            push_timeout_secs: 5,
        }
    }
}

/// Loki log push configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LokiConfig {
    /// Base URL; `/loki/api/v1/push` is appended.
    pub host: String,

    /// Basic auth user. Auth is only sent when both user and password are set.
    pub username: String,

    pub password: String,
}

/// Host value that means "no Loki configured".
pub const DEFAULT_LOKI_HOST: &str = "http://localhost:3100";

impl LokiConfig {
    /// Pushing is skipped for an empty or default host.
    pub fn is_enabled(&self) -> bool {
        !self.host.is_empty() && self.host != DEFAULT_LOKI_HOST
    }

    /// Full push endpoint.
    pub fn push_url(&self) -> String {
        format!("{}/loki/api/v1/push", self.host.trim_end_matches('/'))
    }
}

impl Default for LokiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LOKI_HOST.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Grafana Cloud OTLP metrics push configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GrafanaConfig {
    /// OTLP/HTTP metrics endpoint.
    pub metrics_url: String,

    /// Grafana Cloud instance (account) id, used as the basic auth user.
    pub username: String,

    /// API key. Pushing is disabled while this is empty.
    pub api_key: String,
}

impl GrafanaConfig {
    pub fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl Default for GrafanaConfig {
    fn default() -> Self {
        Self {
            metrics_url: "https://otlp-gateway-prod-ap-south-1.grafana.net/otlp/v1/metrics"
                .to_string(),
            username: "1464513".to_string(),
            api_key: String::new(),
        }
    }
}

/// Where the exchange-rate endpoint gets currency data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurrencySourceKind {
    /// Call the currency lookup directly.
    #[default]
    InProcess,
    /// Call `GET {currency_base_url}/api/currency/{country}` over HTTP.
    Http,
}

/// Exchange-rate endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub currency_source: CurrencySourceKind,

    /// Base URL of the currency API when `currency_source = "http"`.
    pub currency_base_url: String,

    /// Deadline for the currency call in seconds.
    pub timeout_secs: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            currency_source: CurrencySourceKind::InProcess,
            currency_base_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 5,
        }
    }
}
