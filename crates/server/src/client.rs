use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-cg-demo-api-key";
pub const DEFAULT_REVALIDATE_SECONDS: u64 = 60;

/// A query-string value. `None` and empty strings are left out of the URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
}

impl Param {
    fn render(&self) -> Option<String> {
        match self {
            Param::Str(s) if s.is_empty() => None,
            Param::Str(s) => Some(s.clone()),
            Param::Int(n) => Some(n.to_string()),
            Param::Bool(b) => Some(b.to_string()),
            Param::None => None,
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Str(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Int(value as i64)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        value.map_or(Param::None, Into::into)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    status: Option<ErrorStatus>,
}

/// Best-effort message for a failed response: the body's `error` field,
/// then `status.error_message`, then the reason phrase. Never empty.
pub fn error_message(status: StatusCode, body: &[u8]) -> String {
    let from_body = serde_json::from_slice::<ErrorBody>(body).ok().and_then(|b| {
        let error = b.error.and_then(|e| match e {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
        error.or(b.status.and_then(|s| s.error_message))
    });

    from_body
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "unknown error".to_string())
}

/// Builds `{base}/{endpoint}?{params}` with exactly one slash at the join.
pub fn build_url(base_url: &str, endpoint: &str, params: &[(&str, Param)]) -> Result<Url, ApiError> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), endpoint.trim_start_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| ApiError::Url(format!("{}: {}", raw, e)))?;

    let pairs: Vec<(&str, String)> = params
        .iter()
        .filter_map(|(key, value)| value.render().map(|v| (*key, v)))
        .collect();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

/// JSON client for the market-data API. Without an API key it talks to the
/// public, unauthenticated endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    revalidate_seconds: u64,
}

impl CoinGeckoClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        CoinGeckoClient {
            http,
            base_url: base_url.into(),
            api_key,
            revalidate_seconds: DEFAULT_REVALIDATE_SECONDS,
        }
    }

    pub fn with_revalidate(mut self, seconds: u64) -> Self {
        self.revalidate_seconds = seconds;
        self
    }

    /// Freshness window for pages built from this client's data.
    pub fn revalidate_seconds(&self) -> u64 {
        self.revalidate_seconds
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, Param)]) -> Result<T, ApiError> {
        let url = build_url(&self.base_url, endpoint, params)?;
        debug!("GET {}", url);

        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!("{} returned {}: {}", endpoint, status.as_u16(), message);
            if status == StatusCode::UNAUTHORIZED {
                warn!("API key authentication failed - check COINGECKO_API_KEY");
            }
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

pub fn build_http_client(timeout_seconds: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("arxcrypto/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_upstream;

    #[test]
    fn test_build_url_joins_and_skips_empty() {
        let url = build_url(
            "https://api.example.com/api/v3/",
            "/coins/markets",
            &[
                ("vs_currency", "usd".into()),
                ("ids", "".into()),
                ("per_page", 100u32.into()),
                ("sparkline", false.into()),
                ("category", Param::from(None::<String>)),
            ],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.example.com/api/v3/coins/markets?vs_currency=usd&per_page=100&sparkline=false"
        );
    }

    #[test]
    fn test_build_url_without_params() {
        let url = build_url("https://api.example.com/api/v3", "search/trending", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v3/search/trending");
    }

    #[test]
    fn test_build_url_encodes_values() {
        let url = build_url("http://localhost", "search", &[("query", "shiba inu&co".into())]).unwrap();
        assert_eq!(url.query(), Some("query=shiba+inu%26co"));
    }

    #[test]
    fn test_build_url_rejects_garbage_base() {
        let err = build_url("not a url", "coins", &[]).unwrap_err();
        assert!(matches!(err, ApiError::Url(_)));
    }

    #[test]
    fn test_error_message_sources() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, br#"{"error":"coin not found"}"#), "coin not found");
        assert_eq!(
            error_message(
                StatusCode::TOO_MANY_REQUESTS,
                br#"{"status":{"error_code":429,"error_message":"You've exceeded the Rate Limit"}}"#
            ),
            "You've exceeded the Rate Limit"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, b"<html>oops</html>"), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, br#"{"error":""}"#), "Bad Request");
        assert_eq!(error_message(StatusCode::from_u16(599).unwrap(), b""), "unknown error");
    }

    #[actix_web::test]
    async fn test_fetch_sends_key_and_params() {
        let base = spawn_upstream().await;
        let client = CoinGeckoClient::new(Client::new(), base, Some("secret".to_string()));

        let echo: serde_json::Value = client
            .fetch("/echo", &[("query", "btc".into()), ("skip", "".into())])
            .await
            .unwrap();

        assert_eq!(echo["api_key"], "secret");
        assert_eq!(echo["query"], "query=btc");
    }

    #[actix_web::test]
    async fn test_public_client_sends_no_key() {
        let base = spawn_upstream().await;
        let client = CoinGeckoClient::new(Client::new(), base, None);
        assert!(!client.is_authenticated());

        let echo: serde_json::Value = client.fetch("echo", &[]).await.unwrap();
        assert_eq!(echo["api_key"], serde_json::Value::Null);
        assert_eq!(echo["query"], "");
    }

    #[actix_web::test]
    async fn test_non_success_carries_status_and_message() {
        let base = spawn_upstream().await;
        let client = CoinGeckoClient::new(Client::new(), base, Some("k".to_string()));

        let err = client.fetch::<serde_json::Value>("/coins/missing", &[]).await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "coin not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        for (path, expected_status) in [("/status/500", 500u16), ("/status/429", 429), ("/status/599", 599)] {
            let err = client.fetch::<serde_json::Value>(path, &[]).await.unwrap_err();
            assert_eq!(err.upstream_status(), Some(expected_status));
            assert!(!err.to_string().is_empty());
            if let ApiError::Status { message, .. } = err {
                assert!(!message.is_empty());
            }
        }
    }

    #[actix_web::test]
    async fn test_undecodable_body() {
        let base = spawn_upstream().await;
        let client = CoinGeckoClient::new(Client::new(), base, None);
        let err = client.fetch::<Vec<u32>>("/echo", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn test_revalidate_window() {
        let client = CoinGeckoClient::new(Client::new(), "http://localhost", None);
        assert_eq!(client.revalidate_seconds(), DEFAULT_REVALIDATE_SECONDS);
        assert_eq!(client.with_revalidate(300).revalidate_seconds(), 300);
    }
}
