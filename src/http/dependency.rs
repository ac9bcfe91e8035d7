//! Currency dependency of the exchange-rate endpoint.
//!
//! # Responsibilities
//! - Resolve a country's currency either in-process or over HTTP
//! - Forward the caller's request ID on HTTP calls
//! - Enforce a deadline on the HTTP call
//!
//! # Design Decisions
//! - In-process is the default; it reuses the currency lookup directly and
//!   does not touch the currency endpoint's metrics
//! - Any non-success HTTP status is reported as `Missing` with the body as-is
//! - Timeouts, transport errors and undecodable bodies are faults

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{CurrencySourceKind, ExchangeConfig};
use crate::http::handlers::{lookup_currency, CurrencyResponse};
use crate::http::instrument::CountryKey;

/// Outcome of a currency resolution that reached the currency API.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrencyOutcome {
    Found(CurrencyResponse),
    /// The currency API answered with an error; its body is kept verbatim.
    Missing(Value),
}

/// The currency API could not be consulted.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("currency request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("currency request timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid currency base URL '{0}'")]
    InvalidBaseUrl(String),
}

/// Where the exchange-rate endpoint gets its currency data.
#[derive(Debug, Clone)]
pub enum CurrencySource {
    InProcess,
    Http(HttpCurrencyClient),
}

impl CurrencySource {
    pub fn from_config(config: &ExchangeConfig) -> Result<Self, DependencyError> {
        match config.currency_source {
            CurrencySourceKind::InProcess => Ok(Self::InProcess),
            CurrencySourceKind::Http => Ok(Self::Http(HttpCurrencyClient::new(
                &config.currency_base_url,
                Duration::from_secs(config.timeout_secs),
            )?)),
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            CurrencySource::InProcess => "in-process".to_string(),
            CurrencySource::Http(client) => client.base_url.to_string(),
        }
    }

    pub async fn fetch(
        &self,
        country: &CountryKey,
        request_id: &str,
    ) -> Result<CurrencyOutcome, DependencyError> {
        match self {
            CurrencySource::InProcess => Ok(match lookup_currency(country) {
                Ok(currency) => CurrencyOutcome::Found(currency),
                Err(e) => CurrencyOutcome::Missing(e.body()),
            }),
            CurrencySource::Http(client) => client.fetch(&country.raw, request_id).await,
        }
    }
}

/// Calls `GET {base}/api/currency/{country}`.
#[derive(Debug, Clone)]
pub struct HttpCurrencyClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpCurrencyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DependencyError> {
        let base_url =
            Url::parse(base_url).map_err(|_| DependencyError::InvalidBaseUrl(base_url.into()))?;
        if base_url.cannot_be_a_base() {
            return Err(DependencyError::InvalidBaseUrl(base_url.into()));
        }

        // The deadline is enforced around the whole call in `fetch`.
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// URL of the currency endpoint for a raw country segment.
    pub fn currency_url(&self, raw_country: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "currency", raw_country]);
        }
        url
    }

    pub async fn fetch(
        &self,
        raw_country: &str,
        request_id: &str,
    ) -> Result<CurrencyOutcome, DependencyError> {
        let call = async {
            let response = self
                .client
                .get(self.currency_url(raw_country))
                .header("x-request-id", request_id)
                .header("content-type", "application/json")
                .send()
                .await?;

            let outcome = if response.status().is_success() {
                CurrencyOutcome::Found(response.json().await?)
            } else {
                CurrencyOutcome::Missing(response.json().await?)
            };
            Ok::<_, DependencyError>(outcome)
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DependencyError::Timeout(self.timeout.as_secs())),
        }
    }
}
