//! The request boundary and its HTTP implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client as HttpClient, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::auth::StaticToken;
use super::envelope::response_message;
use super::query::QueryParams;
use super::rate_limiter::RateLimiter;
use crate::error::{Error, Result};

/// "Send a request, get JSON back or fail."
///
/// Everything above this trait is transport-agnostic; tests substitute an
/// in-memory implementation.
pub trait Transport: Send + Sync {
    fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// GET with `params` encoded into the query string.
    fn parameterized_request(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> impl Future<Output = Result<Value>> + Send;
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub requests_per_second: f64,
    pub token: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mangadex.org".to_string(),
            user_agent: concat!("mangadex-client/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            requests_per_second: 5.0,
            token: None,
        }
    }
}

impl From<&shared::config::ApiConfig> for TransportConfig {
    fn from(api: &shared::config::ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            user_agent: api.user_agent.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
            requests_per_second: api.requests_per_second,
            token: api.token().map(String::from),
        }
    }
}

/// reqwest-backed transport with bearer auth and request pacing.
pub struct HttpTransport {
    /// HTTP client
    http: HttpClient,
    /// API root, without trailing slash
    base_url: String,
    /// Session token sent as `Authorization: Bearer`
    credentials: Option<StaticToken>,
    rate_limiter: RateLimiter,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config
                .token
                .filter(|t| !t.trim().is_empty())
                .map(StaticToken::new),
            rate_limiter: RateLimiter::new(config.requests_per_second),
        })
    }

    /// Guard for the token this transport sends, if it has one.
    ///
    /// Pair it with the transport through [`Client::with_guard`](super::Client::with_guard)
    /// so `authorize()` vouches for the credentials that actually go out.
    pub fn credentials(&self) -> Option<StaticToken> {
        self.credentials.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(credentials) => builder.bearer_auth(credentials.token()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &str) -> Result<Value> {
        self.rate_limiter.acquire().await;

        let response = self.authorized(builder).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .map(|body| response_message(&body))
                .unwrap_or(text);
            warn!(url = %url, status = status.as_u16(), error = %message, "Request failed");
            return Err(Error::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(url = %url, status = status.as_u16(), "Request successful");
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl Transport for HttpTransport {
    async fn request(&self, path: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        let url = self.url(path);
        let mut builder = self.http.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder, &url).await
    }

    async fn parameterized_request(&self, path: &str, params: &QueryParams) -> Result<Value> {
        let url = self.url(path);
        let builder = self.http.get(&url).query(&params.to_pairs());
        self.send(builder, &url).await
    }
}
