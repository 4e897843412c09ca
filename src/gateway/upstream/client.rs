// Upstream client
// reqwest wrapper for the provider's generateContent endpoint

use futures::future::BoxFuture;
use reqwest::{header, Client};
use serde_json::Value;
use tokio::time::Duration;
use url::Url;

use crate::gateway::common::error_classifier::{classify_http_failure, transport_error_from};
use crate::gateway::error::GatewayError;
use crate::models::config::{UpstreamConfig, UpstreamProxyConfig};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// The single outbound call the gateway makes.
///
/// Implemented by `UpstreamClient` for real traffic; tests substitute a
/// capturing mock.
pub trait UpstreamTransport: Send + Sync {
    /// POST `body` to `model`'s generateContent and return the decoded JSON
    fn generate_content<'a>(
        &'a self,
        api_key: &'a str,
        model: &'a str,
        body: Value,
    ) -> BoxFuture<'a, Result<Value, GatewayError>>;
}

/// Normalize a proxy URL (ensure a scheme prefix)
pub fn normalize_proxy_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://")
        || trimmed.starts_with("https://")
        || trimmed.starts_with("socks5://")
        || trimmed.starts_with("socks5h://")
    {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

pub struct UpstreamClient {
    client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let base_url = Self::validate_base_url(&config.base_url)?;
        let client = Self::build_client(config)
            .map_err(|e| GatewayError::Config(format!("failed_to_build_http_client: {}", e)))?;
        Ok(Self { client, base_url })
    }

    /// Build client with optional upstream proxy
    fn build_client(config: &UpstreamConfig) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str());

        if let Some(proxy) = Self::build_proxy(&config.proxy) {
            builder = builder.proxy(proxy);
        }

        builder.build()
    }

    fn build_proxy(config: &UpstreamProxyConfig) -> Option<reqwest::Proxy> {
        if !config.enabled || config.url.trim().is_empty() {
            return None;
        }
        let url = normalize_proxy_url(&config.url);
        match reqwest::Proxy::all(&url) {
            Ok(proxy) => {
                tracing::info!("UpstreamClient enabled proxy: {}", url);
                Some(proxy)
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid upstream proxy {}: {}", url, e);
                None
            }
        }
    }

    fn validate_base_url(base_url: &str) -> Result<String, GatewayError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| GatewayError::Config(format!("invalid_base_url: {}", e)))?;
        match parsed.scheme() {
            "https" | "http" => Ok(parsed.as_str().trim_end_matches('/').to_string()),
            other => Err(GatewayError::Config(format!(
                "invalid_base_url: unsupported scheme {}",
                other
            ))),
        }
    }

    /// Build `{base}/models/{model}:generateContent`
    fn build_url(base_url: &str, model: &str) -> String {
        let model = model.trim().trim_start_matches("models/");
        format!("{}/models/{}:generateContent", base_url, model)
    }

    async fn post_generate_content(
        &self,
        api_key: &str,
        model: &str,
        body: Value,
    ) -> Result<Value, GatewayError> {
        let url = Self::build_url(&self.base_url, model);

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let mut key_value = header::HeaderValue::from_str(api_key)
            .map_err(|_| GatewayError::Auth("API key contains invalid characters".to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error_from(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status.as_u16(), &error_text));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| transport_error_from(&e))
    }
}

impl UpstreamTransport for UpstreamClient {
    fn generate_content<'a>(
        &'a self,
        api_key: &'a str,
        model: &'a str,
        body: Value,
    ) -> BoxFuture<'a, Result<Value, GatewayError>> {
        Box::pin(self.post_generate_content(api_key, model, body))
    }
}
