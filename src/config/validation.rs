//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, queue capacity > 0)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, CurrencySourceKind};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.observability.push_queue_capacity == 0 {
        errors.push(ValidationError::new(
            "observability.push_queue_capacity",
            "must be > 0",
        ));
    }

    if config.observability.push_concurrency == 0 {
        errors.push(ValidationError::new(
            "observability.push_concurrency",
            "must be > 0",
        ));
    }

    if config.observability.push_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "observability.push_timeout_secs",
            "must be > 0",
        ));
    }

    if config.loki.is_enabled() {
        check_url(&mut errors, "loki.host", &config.loki.host);
    }

    if config.grafana.is_enabled() {
        check_url(&mut errors, "grafana.metrics_url", &config.grafana.metrics_url);
    }

    if config.exchange.timeout_secs == 0 {
        errors.push(ValidationError::new("exchange.timeout_secs", "must be > 0"));
    }

    if config.exchange.currency_source == CurrencySourceKind::Http {
        check_url(
            &mut errors,
            "exchange.currency_base_url",
            &config.exchange.currency_base_url,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = Url::parse(value) {
        errors.push(ValidationError::new(field, format!("'{}': {}", value, e)));
    }
}
