use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub country: String,
    pub national_animal: String,
    pub scientific_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capital {
    pub country: String,
    pub capital_city: String,
    pub capital_population: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub country: String,
    pub currency: String,
    pub symbol: String,
    #[serde(rename = "valueAgainstUSD")]
    pub value_against_usd: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateQuote {
    pub country: String,
    pub currency: CurrencyName,
    pub exchange_rate: Rate,
    pub example: Example,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyName {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub amount: u32,
    pub converted: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub dependency_api: String,
    pub processing_time_ms: u64,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Value>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base url: {0}")]
    InvalidUrl(String),

    #[error("api returned {status}: {}", body.message)]
    Api { status: u16, body: ErrorBody },

    #[error("api returned {status} with unexpected body: {text}")]
    Unexpected { status: u16, text: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The `error` code of an API error response, if this is one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { body, .. } => Some(&body.error),
            _ => None,
        }
    }
}

pub struct CountryClient {
    client: Client,
    base_url: Url,
}

impl CountryClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder().no_proxy().build()?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    pub async fn get_animal(&self, country: &str) -> Result<Animal, ClientError> {
        self.get_json(&["api", "animal", country]).await
    }

    pub async fn get_capital(&self, country: &str) -> Result<Capital, ClientError> {
        self.get_json(&["api", "capital", country]).await
    }

    pub async fn get_currency(&self, country: &str) -> Result<Currency, ClientError> {
        self.get_json(&["api", "currency", country]).await
    }

    pub async fn get_exchange_rate(&self, country: &str) -> Result<ExchangeRateQuote, ClientError> {
        self.get_json(&["api", "exchange-rate", country]).await
    }

    /// Raw Prometheus text exposition.
    pub async fn metrics(&self) -> Result<String, ClientError> {
        let resp = self.client.get(self.url(&["api", "metrics"])).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Unexpected {
                status: status.as_u16(),
                text,
            });
        }
        Ok(text)
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let resp = self.client.get(self.url(segments)).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => Err(ClientError::Api {
                    status: status.as_u16(),
                    body,
                }),
                Err(_) => Err(ClientError::Unexpected {
                    status: status.as_u16(),
                    text,
                }),
            };
        }

        Ok(serde_json::from_str(&text)?)
    }
}
