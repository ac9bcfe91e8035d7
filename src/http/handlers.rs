//! Lookup endpoints: national animal, capital, currency.

use axum::{
    extract::State,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::facts;
use crate::http::instrument::{instrumented, CountryKey, ANIMAL, CAPITAL, CURRENCY};
use crate::http::request::{ApiRequest, CountrySegment};
use crate::http::response::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalResponse {
    pub country: String,
    pub national_animal: String,
    pub scientific_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalResponse {
    pub country: String,
    pub capital_city: String,
    pub capital_population: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyResponse {
    pub country: String,
    pub currency: String,
    pub symbol: String,
    #[serde(rename = "valueAgainstUSD")]
    pub value_against_usd: String,
    /// UTC date at response time, `YYYY-MM-DD`.
    pub date: String,
}

pub fn lookup_animal(country: &CountryKey) -> Result<AnimalResponse, ApiError> {
    let fact = facts::animal(&country.key)
        .ok_or_else(|| ApiError::not_found("National animal", &country.raw))?;

    Ok(AnimalResponse {
        country: country.raw.clone(),
        national_animal: fact.animal.to_string(),
        scientific_name: fact.scientific_name.to_string(),
    })
}

pub fn lookup_capital(country: &CountryKey) -> Result<CapitalResponse, ApiError> {
    let fact = facts::capital(&country.key)
        .ok_or_else(|| ApiError::not_found("Capital city", &country.raw))?;

    Ok(CapitalResponse {
        country: country.raw.clone(),
        capital_city: fact.capital.to_string(),
        capital_population: fact.population.to_string(),
    })
}

pub fn lookup_currency(country: &CountryKey) -> Result<CurrencyResponse, ApiError> {
    let fact = facts::currency(&country.key)
        .ok_or_else(|| ApiError::not_found("Currency", &country.raw))?;

    Ok(CurrencyResponse {
        country: country.raw.clone(),
        currency: fact.currency.to_string(),
        symbol: fact.symbol.to_string(),
        value_against_usd: fact.value_against_usd.to_string(),
        date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
    })
}

pub async fn get_animal(
    State(state): State<AppState>,
    CountrySegment(country): CountrySegment,
    request: ApiRequest,
) -> Response {
    instrumented(&state.telemetry, ANIMAL, country, request, |country| async move {
        lookup_animal(&country)
    })
    .await
}

pub async fn get_capital(
    State(state): State<AppState>,
    CountrySegment(country): CountrySegment,
    request: ApiRequest,
) -> Response {
    instrumented(&state.telemetry, CAPITAL, country, request, |country| async move {
        lookup_capital(&country)
    })
    .await
}

pub async fn get_currency(
    State(state): State<AppState>,
    CountrySegment(country): CountrySegment,
    request: ApiRequest,
) -> Response {
    instrumented(&state.telemetry, CURRENCY, country, request, |country| async move {
        lookup_currency(&country)
    })
    .await
}
