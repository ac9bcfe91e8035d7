//! End-to-end tests against a running server.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use country_info_api::config::CurrencySourceKind;
use country_info_sdk::{ClientError, CountryClient};
use reqwest::StatusCode;
use serde_json::Value;

mod common;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[tokio::test]
async fn test_lookups_accept_case_and_hyphen_variants() {
    let server = addr(29101);
    let shutdown = common::start_server(common::test_config(server)).await;
    let api = CountryClient::new(&format!("http://{server}")).unwrap();

    let animal = api.get_animal("United-States").await.unwrap();
    assert_eq!(animal.country, "United-States");
    assert_eq!(animal.national_animal, "Bald Eagle");
    assert_eq!(animal.scientific_name, "Haliaeetus leucocephalus");

    let capital = api.get_capital("SOUTH-KOREA").await.unwrap();
    assert_eq!(capital.capital_city, "Seoul");
    assert_eq!(capital.capital_population, "9,733,509");

    let currency = api.get_currency("japan").await.unwrap();
    assert_eq!(currency.currency, "Japanese Yen");
    assert_eq!(currency.symbol, "JPY");
    assert_eq!(currency.value_against_usd, "149.50");
    assert_eq!(currency.date.len(), 10);

    let spaced = api.get_currency("south korea").await.unwrap();
    assert_eq!(spaced.symbol, "KRW");
    assert_eq!(spaced.country, "south korea");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_country_is_not_found() {
    let server = addr(29102);
    let shutdown = common::start_server(common::test_config(server)).await;
    let api = CountryClient::new(&format!("http://{server}")).unwrap();

    match api.get_animal("Atlantis").await {
        Err(ClientError::Api { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body.error, "not_found");
            assert_eq!(body.message, "National animal data for \"Atlantis\" is not available");
        }
        other => panic!("expected not_found, got {other:?}"),
    }

    // Tables are independent: switzerland has a currency but no capital.
    let err = api.get_capital("switzerland").await.unwrap_err();
    assert_eq!(err.code(), Some("not_found"));
    assert!(api.get_currency("switzerland").await.is_ok());

    shutdown.trigger();
}

#[tokio::test]
async fn test_exchange_rate_japan() {
    let server = addr(29103);
    let shutdown = common::start_server(common::test_config(server)).await;
    let api = CountryClient::new(&format!("http://{server}")).unwrap();

    let quote = api.get_exchange_rate("Japan").await.unwrap();
    assert_eq!(quote.country, "Japan");
    assert_eq!(quote.currency.name, "Japanese Yen");
    assert_eq!(quote.currency.symbol, "JPY");
    assert_eq!(quote.exchange_rate.from, "JPY");
    assert_eq!(quote.exchange_rate.to, "INR");
    assert_eq!(quote.exchange_rate.rate, 0.56);
    assert_eq!(quote.exchange_rate.description, "1 JPY = ₹0.56 INR");
    assert_eq!(quote.example.amount, 100);
    assert_eq!(quote.example.converted, 56.0);
    assert_eq!(quote.example.description, "100 JPY = ₹56.00 INR");
    assert_eq!(quote.metadata.dependency_api, "/api/currency");

    let india = api.get_exchange_rate("india").await.unwrap();
    assert_eq!(india.exchange_rate.rate, 1.0);
    assert_eq!(india.example.converted, 100.0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_exchange_rate_errors() {
    let server = addr(29104);
    let shutdown = common::start_server(common::test_config(server)).await;
    let api = CountryClient::new(&format!("http://{server}")).unwrap();

    let currency_err = match api.get_currency("Atlantis").await {
        Err(ClientError::Api { body, .. }) => body,
        other => panic!("expected error body, got {other:?}"),
    };

    match api.get_exchange_rate("Atlantis").await {
        Err(ClientError::Api { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body.error, "dependency_not_found");
            assert_eq!(body.message, "Could not find currency for \"Atlantis\"");
            assert_eq!(body.dependency_api.as_deref(), Some("/api/currency"));
            assert_eq!(body.details, Some(serde_json::to_value(&currency_err).unwrap()));
        }
        other => panic!("expected dependency_not_found, got {other:?}"),
    }

    match api.get_exchange_rate("Switzerland").await {
        Err(ClientError::Api { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body.error, "conversion_rate_not_found");
            assert_eq!(body.message, "INR conversion rate for CHF is not available");
            assert_eq!(body.currency.unwrap()["symbol"], "CHF");
        }
        other => panic!("expected conversion_rate_not_found, got {other:?}"),
    }

    shutdown.trigger();
}

fn sample_value(metrics: &str, name: &str, labels: &[&str]) -> Option<f64> {
    metrics
        .lines()
        .filter(|line| line.starts_with(&format!("{name}{{")))
        .find(|line| labels.iter().all(|label| line.contains(label)))
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

#[tokio::test]
async fn test_metrics_count_requests() {
    let server = addr(29105);
    let shutdown = common::start_server(common::test_config(server)).await;
    let api = CountryClient::new(&format!("http://{server}")).unwrap();

    for _ in 0..3 {
        api.get_capital("Mexico").await.unwrap();
    }
    let _ = api.get_capital("Mordor").await;

    let response = common::client()
        .get(format!("http://{server}/api/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let metrics = response.text().await.unwrap();

    assert_eq!(
        sample_value(
            &metrics,
            "http_requests_total",
            &[r#"route="/api/capital""#, r#"country="mexico""#, r#"status_code="200""#, r#"method="GET""#],
        ),
        Some(3.0)
    );
    assert_eq!(
        sample_value(
            &metrics,
            "api_calls_by_country_total",
            &[r#"country="mexico""#, r#"endpoint="capital""#],
        ),
        Some(3.0)
    );
    assert_eq!(
        sample_value(
            &metrics,
            "http_requests_total",
            &[r#"route="/api/capital""#, r#"country="mordor""#, r#"status_code="404""#],
        ),
        Some(1.0)
    );
    assert!(
        sample_value(
            &metrics,
            "api_errors_total",
            &[r#"route="/api/capital""#, r#"error_type="not_found""#],
        )
        .unwrap()
            >= 1.0
    );
    assert!(metrics.contains("http_request_duration_seconds_bucket"));
    assert!(metrics.lines().any(|line| line.starts_with("process_")));

    shutdown.trigger();
}

#[tokio::test]
async fn test_undecodable_country_is_counted_as_not_found() {
    let server = addr(29109);
    let shutdown = common::start_server(common::test_config(server)).await;

    let response = common::client()
        .get(format!("http://{server}/api/animal/%FF"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let metrics = common::client()
        .get(format!("http://{server}/api/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(
        sample_value(
            &metrics,
            "http_requests_total",
            &[r#"route="/api/animal""#, "country=\"\u{FFFD}\"", r#"status_code="404""#],
        ),
        Some(1.0)
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = addr(29106);
    let shutdown = common::start_server(common::test_config(server)).await;

    let response = common::client()
        .get(format!("http://{server}/api/animal/india"))
        .header("x-request-id", "it-request-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "it-request-1");

    let response = common::client()
        .get(format!("http://{server}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("/api/"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_http_currency_source_calls_itself() {
    let server = addr(29107);
    let mut config = common::test_config(server);
    config.exchange.currency_source = CurrencySourceKind::Http;
    config.exchange.currency_base_url = format!("http://{server}");
    let shutdown = common::start_server(config).await;
    let api = CountryClient::new(&format!("http://{server}")).unwrap();

    let quote = api.get_exchange_rate("united-kingdom").await.unwrap();
    assert_eq!(quote.exchange_rate.from, "GBP");
    assert_eq!(quote.exchange_rate.rate, 105.5);
    assert_eq!(quote.example.converted, 10550.0);

    let err = api.get_exchange_rate("Narnia").await.unwrap_err();
    assert_eq!(err.code(), Some("dependency_not_found"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_currency_source_is_internal_error() {
    let server = addr(29108);
    let mut config = common::test_config(server);
    config.exchange.currency_source = CurrencySourceKind::Http;
    // Nothing listens here.
    config.exchange.currency_base_url = "http://127.0.0.1:29199".to_string();
    config.exchange.timeout_secs = 2;
    let shutdown = common::start_server(config).await;

    let response = common::client()
        .get(format!("http://{server}/api/exchange-rate/japan"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Failed to fetch exchange rate");

    shutdown.trigger();
}

#[tokio::test]
async fn test_silent_currency_source_times_out() {
    let server = addr(29110);
    let silent = addr(29111);
    common::start_silent_backend(silent).await;

    let mut config = common::test_config(server);
    config.exchange.currency_source = CurrencySourceKind::Http;
    config.exchange.currency_base_url = format!("http://{silent}");
    config.exchange.timeout_secs = 1;
    let shutdown = common::start_server(config).await;

    let started = Instant::now();
    let response = common::client()
        .get(format!("http://{server}/api/exchange-rate/japan"))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Failed to fetch exchange rate");
    assert!(elapsed >= Duration::from_millis(900), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "deadline not enforced: {elapsed:?}");

    shutdown.trigger();
}
