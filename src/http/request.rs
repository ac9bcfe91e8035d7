//! Request introspection.
//!
//! # Responsibilities
//! - Generate a request ID when the client did not send one
//! - Infer the client IP from proxy headers
//! - Collect the headers, geo hints and query parameters that go into logs
//! - Hand the country path segment to handlers without rejecting it
//!
//! # Design Decisions
//! - Request ID added as early as possible (outermost layer) for tracing
//! - Client IP header priority: x-forwarded-for, x-real-ip, cf-connecting-ip
//! - Absent optional fields are omitted from the log record, not nulled
//! - The country segment is percent-decoded lossily; bytes that are not
//!   UTF-8 become U+FFFD and fall through to the normal lookup

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap, HeaderName, Method, Uri};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that stamps a UUID `x-request-id` on requests lacking one.
pub type RequestIdLayer = SetRequestIdLayer<MakeRequestUuid>;

pub fn request_id_layer() -> RequestIdLayer {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

/// Geo hints set by the edge network.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

impl GeoHints {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let geo = Self {
            country: header(headers, "x-vercel-ip-country"),
            country_region: header(headers, "x-vercel-ip-country-region"),
            city: header(headers, "x-vercel-ip-city"),
            latitude: header(headers, "x-vercel-ip-latitude"),
            longitude: header(headers, "x-vercel-ip-longitude"),
        };
        (geo != Self::default()).then_some(geo)
    }
}

/// Everything about the caller that ends up in the request log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub request_id: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoHints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<BTreeMap<String, String>>,
    pub path: String,
}

impl RequestDetails {
    pub fn from_parts(headers: &HeaderMap, uri: &Uri, peer: Option<SocketAddr>) -> Self {
        let request_id = headers
            .request_id()
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let query_params: BTreeMap<String, String> = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            request_id,
            ip: client_ip(headers, peer),
            user_agent: header(headers, "user-agent"),
            referer: header(headers, "referer"),
            origin: header(headers, "origin"),
            host: header(headers, "host"),
            content_type: header(headers, "content-type"),
            accept_language: header(headers, "accept-language"),
            geo: GeoHints::from_headers(headers),
            query_params: (!query_params.is_empty()).then_some(query_params),
            path: uri.path().to_string(),
        }
    }
}

/// Best guess at the client address. First match wins:
/// `x-forwarded-for` (first hop), `x-real-ip`, `cf-connecting-ip`, the socket
/// peer, then `"unknown"`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    header(headers, "x-forwarded-for")
        .and_then(|v| {
            v.split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
        })
        .or_else(|| header(headers, "x-real-ip"))
        .or_else(|| header(headers, "cf-connecting-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extractor bundling the method and [`RequestDetails`] for API handlers.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub details: RequestDetails,
}

impl<S> FromRequestParts<S> for ApiRequest
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self {
            method: parts.method.clone(),
            details: RequestDetails::from_parts(&parts.headers, &parts.uri, peer),
        })
    }
}

/// The trailing `{country}` path segment, percent-decoded.
///
/// Read from the request URI; the router's own decoded params reject
/// segments that are not UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountrySegment(pub String);

impl CountrySegment {
    pub fn decode(raw: &str) -> Self {
        Self(percent_decode_str(raw).decode_utf8_lossy().into_owned())
    }
}

impl<S> FromRequestParts<S> for CountrySegment
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts.uri.path().rsplit('/').next().unwrap_or_default();
        Ok(Self::decode(raw))
    }
}
