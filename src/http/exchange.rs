//! Exchange-rate endpoint: currency lookup composed with the INR rate table.

use std::time::Instant;

use axum::{
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::facts;
use crate::http::dependency::CurrencyOutcome;
use crate::http::instrument::{instrumented, CountryKey, CURRENCY, EXCHANGE_RATE};
use crate::http::request::{ApiRequest, CountrySegment};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::logging::{error_chain, LogLevel};

/// Target currency of every conversion.
pub const TARGET_CURRENCY: &str = "INR";

/// Amount used for the worked example.
pub const EXAMPLE_AMOUNT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateResponse {
    pub country: String,
    pub currency: CurrencySummary,
    pub exchange_rate: ExchangeRate,
    pub example: ConversionExample,
    pub metadata: ExchangeMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    /// INR per unit, as stored.
    pub rate: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionExample {
    pub amount: u32,
    pub converted: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeMetadata {
    pub dependency_api: String,
    pub processing_time_ms: u64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub async fn get_exchange_rate(
    State(state): State<AppState>,
    CountrySegment(country): CountrySegment,
    request: ApiRequest,
) -> Response {
    let request_id = request.details.request_id.clone();
    let deps = state.clone();
    instrumented(
        &state.telemetry,
        EXCHANGE_RATE,
        country,
        request,
        |country| async move { exchange_rate(&deps, &country, &request_id).await },
    )
    .await
}

/// Resolve the currency for `country` and convert it to INR.
pub async fn exchange_rate(
    state: &AppState,
    country: &CountryKey,
    request_id: &str,
) -> Result<ExchangeRateResponse, ApiError> {
    let started = Instant::now();

    state.telemetry.log(
        LogLevel::Info,
        "Calling currency source",
        json!({
            "country": country.key,
            "source": state.currency.describe(),
            "requestId": request_id,
            "step": "fetching_currency",
        }),
    );

    let currency = match state.currency.fetch(country, request_id).await {
        Ok(CurrencyOutcome::Found(currency)) => currency,
        Ok(CurrencyOutcome::Missing(details)) => {
            return Err(ApiError::DependencyNotFound {
                country: country.raw.clone(),
                details,
                dependency_api: CURRENCY.route,
            });
        }
        Err(fault) => {
            state.telemetry.log(
                LogLevel::Error,
                "Exchange rate API error",
                json!({
                    "country": country.key,
                    "error": fault.to_string(),
                    "causes": error_chain(&fault),
                }),
            );
            return Err(ApiError::Internal("Failed to fetch exchange rate"));
        }
    };

    state.telemetry.log(
        LogLevel::Info,
        "Currency API response received",
        json!({
            "country": country.key,
            "currency": currency.currency,
            "symbol": currency.symbol,
            "step": "currency_fetched",
        }),
    );

    let Some(rate) = facts::inr_rate(&currency.symbol) else {
        return Err(ApiError::ConversionRateNotFound {
            symbol: currency.symbol.clone(),
            currency: serde_json::to_value(&currency).unwrap_or_default(),
        });
    };

    let converted = f64::from(EXAMPLE_AMOUNT) * rate;
    let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    state.telemetry.log(
        LogLevel::Info,
        "Exchange rate calculation complete",
        json!({
            "country": country.key,
            "fromCurrency": currency.symbol,
            "toCurrency": TARGET_CURRENCY,
            "rate": rate,
            "processingTimeMs": processing_time_ms,
        }),
    );

    Ok(ExchangeRateResponse {
        country: country.raw.clone(),
        currency: CurrencySummary {
            name: currency.currency.clone(),
            symbol: currency.symbol.clone(),
        },
        exchange_rate: ExchangeRate {
            from: currency.symbol.clone(),
            to: TARGET_CURRENCY.to_string(),
            rate,
            description: format!("1 {} = ₹{:.2} {}", currency.symbol, rate, TARGET_CURRENCY),
        },
        example: ConversionExample {
            amount: EXAMPLE_AMOUNT,
            converted: round2(converted),
            description: format!(
                "{} {} = ₹{:.2} {}",
                EXAMPLE_AMOUNT, currency.symbol, converted, TARGET_CURRENCY
            ),
        },
        metadata: ExchangeMetadata {
            dependency_api: CURRENCY.route.to_string(),
            processing_time_ms,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::local(crate::config::AppConfig::default()).unwrap()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(56.00000000000001), 56.0);
        assert_eq!(round2(6.4), 6.4);
        assert_eq!(round2(10549.999), 10550.0);
    }

    #[tokio::test]
    async fn test_japan() {
        let response = exchange_rate(&state(), &CountryKey::new("japan"), "req")
            .await
            .unwrap();

        assert_eq!(response.country, "japan");
        assert_eq!(response.currency.name, "Japanese Yen");
        assert_eq!(response.exchange_rate.from, "JPY");
        assert_eq!(response.exchange_rate.to, "INR");
        assert_eq!(response.exchange_rate.rate, 0.56);
        assert_eq!(response.exchange_rate.description, "1 JPY = ₹0.56 INR");
        assert_eq!(response.example.amount, 100);
        assert_eq!(response.example.converted, 56.0);
        assert_eq!(response.example.description, "100 JPY = ₹56.00 INR");
        assert_eq!(response.metadata.dependency_api, "/api/currency");
    }

    #[tokio::test]
    async fn test_full_precision_rate_is_kept() {
        let response = exchange_rate(&state(), &CountryKey::new("South-Korea"), "req")
            .await
            .unwrap();
        assert_eq!(response.exchange_rate.rate, 0.064);
        assert_eq!(response.exchange_rate.description, "1 KRW = ₹0.06 INR");
        assert_eq!(response.example.converted, 6.4);
    }

    #[tokio::test]
    async fn test_missing_rate() {
        let err = exchange_rate(&state(), &CountryKey::new("switzerland"), "req")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "conversion_rate_not_found");

        let body = err.body();
        assert_eq!(body["currency"]["symbol"], "CHF");
        assert_eq!(body["currency"]["country"], "switzerland");
    }

    #[tokio::test]
    async fn test_missing_country() {
        let err = exchange_rate(&state(), &CountryKey::new("Atlantis"), "req")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "dependency_not_found");
        assert_eq!(
            err.body()["details"],
            json!({
                "error": "not_found",
                "message": "Currency data for \"Atlantis\" is not available",
            })
        );
    }
}
