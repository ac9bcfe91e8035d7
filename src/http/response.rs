//! API error responses.
//!
//! # Responsibilities
//! - Define the error taxonomy returned by the API endpoints
//! - Map each error to its HTTP status and JSON body
//!
//! # Design Decisions
//! - Domain errors (`not_found`, `dependency_not_found`,
//!   `conversion_rate_not_found`) are 404
//! - `internal_error` is 500 and carries only a generic message; the cause is
//!   logged by whoever produced it

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors surfaced to API callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The country is not in the endpoint's table.
    #[error("{subject} data for \"{country}\" is not available")]
    NotFound {
        subject: &'static str,
        country: String,
    },

    /// The currency dependency of the exchange-rate endpoint did not succeed.
    #[error("Could not find currency for \"{country}\"")]
    DependencyNotFound {
        country: String,
        /// The dependency's own error body, unmodified.
        details: Value,
        dependency_api: &'static str,
    },

    /// The currency resolved but has no INR conversion entry.
    #[error("INR conversion rate for {symbol} is not available")]
    ConversionRateNotFound {
        symbol: String,
        /// The currency payload that was resolved.
        currency: Value,
    },

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn not_found(subject: &'static str, country: &str) -> Self {
        Self::NotFound {
            subject,
            country: country.to_string(),
        }
    }

    /// Error code placed in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "not_found",
            ApiError::DependencyNotFound { .. } => "dependency_not_found",
            ApiError::ConversionRateNotFound { .. } => "conversion_rate_not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::NOT_FOUND,
        }
    }

    /// JSON body for this error.
    pub fn body(&self) -> Value {
        let mut body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        match self {
            ApiError::DependencyNotFound {
                details,
                dependency_api,
                ..
            } => {
                body["details"] = details.clone();
                body["dependencyApi"] = json!(dependency_api);
            }
            ApiError::ConversionRateNotFound { currency, .. } => {
                body["currency"] = currency.clone();
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
