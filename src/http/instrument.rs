//! Per-request instrumentation shared by all API endpoints.
//!
//! Every API handler funnels through [`instrumented`], which normalizes the
//! country segment, times the endpoint body, records metrics, writes the
//! request log line and renders the result.

use std::future::Future;
use std::time::Instant;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::facts::normalize;
use crate::http::request::ApiRequest;
use crate::http::response::ApiError;
use crate::observability::metrics::RequestMetricEvent;
use crate::observability::Telemetry;

/// Identity of an API endpoint for metrics and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Short name used as the `endpoint` label.
    pub name: &'static str,
    /// Route prefix without the country segment.
    pub route: &'static str,
}

pub const ANIMAL: Endpoint = Endpoint {
    name: "animal",
    route: "/api/animal",
};

pub const CAPITAL: Endpoint = Endpoint {
    name: "capital",
    route: "/api/capital",
};

pub const CURRENCY: Endpoint = Endpoint {
    name: "currency",
    route: "/api/currency",
};

pub const EXCHANGE_RATE: Endpoint = Endpoint {
    name: "exchange-rate",
    route: "/api/exchange-rate",
};

/// A country path segment in both forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryKey {
    /// As received (after percent-decoding), echoed back to callers.
    pub raw: String,
    /// Normalized table key.
    pub key: String,
}

impl CountryKey {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let key = normalize(&raw);
        Self { raw, key }
    }
}

/// Run an endpoint body with metrics and logging around it.
pub async fn instrumented<T, F, Fut>(
    telemetry: &Telemetry,
    endpoint: Endpoint,
    country: String,
    request: ApiRequest,
    body: F,
) -> Response
where
    T: Serialize,
    F: FnOnce(CountryKey) -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let start = Instant::now();
    let country = CountryKey::new(country);
    let display_route = format!("{}/{}", endpoint.route, country.raw);
    let key = country.key.clone();

    let result = body(country).await;

    let (status, error_kind) = match &result {
        Ok(_) => (StatusCode::OK, None),
        Err(e) => (e.status(), Some(e.code())),
    };

    let event = RequestMetricEvent {
        method: request.method.to_string(),
        route: endpoint.route,
        endpoint: endpoint.name,
        status_code: status.as_u16(),
        country: key,
        duration_secs: start.elapsed().as_secs_f64(),
        error_kind,
    };

    telemetry.record_request(&event);
    telemetry.api_request(&event, &display_route, &request.details);

    match result {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => e.into_response(),
    }
}
