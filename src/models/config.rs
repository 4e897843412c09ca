use serde::{Deserialize, Serialize};

use super::operation::OperationKind;

// ============================================================================
// Upstream (provider) configuration
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_USER_AGENT: &str = "grounded-gateway/0.1";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    20
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Outbound HTTP proxy for provider calls
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpstreamProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whole-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub proxy: UpstreamProxyConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
            proxy: UpstreamProxyConfig::default(),
        }
    }
}

// ============================================================================
// Model routing
// ============================================================================

/// Provider model used for each operation kind
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelRoutes {
    pub text_search: String,
    pub place_search: String,
    pub image_edit: String,
    pub image_generate: String,
}

impl Default for ModelRoutes {
    fn default() -> Self {
        Self {
            text_search: "gemini-3-flash-preview".to_string(),
            place_search: "gemini-2.5-flash".to_string(),
            image_edit: "gemini-2.5-flash-image".to_string(),
            image_generate: "gemini-3-pro-image-preview".to_string(),
        }
    }
}

impl ModelRoutes {
    pub fn model_for(&self, kind: OperationKind) -> &str {
        match kind {
            OperationKind::TextSearch => &self.text_search,
            OperationKind::PlaceSearch => &self.place_search,
            OperationKind::ImageEdit => &self.image_edit,
            OperationKind::ImageGenerate => &self.image_generate,
        }
    }
}

// ============================================================================
// Local HTTP surface
// ============================================================================

fn default_port() -> u16 {
    8046
}

fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind 0.0.0.0 instead of 127.0.0.1
    #[serde(default)]
    pub allow_lan_access: bool,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allow_lan_access: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_host(&self) -> &'static str {
        if self.allow_lan_access {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write daily-rolling files under `<data_dir>/logs`
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
            json: false,
        }
    }
}

// ============================================================================
// GatewayConfig
// ============================================================================

#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GatewayConfig {
    /// Provider API key. Env `GEMINI_API_KEY` / `API_KEY` override this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub models: ModelRoutes,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured key, treating blank strings as absent
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("upstream", &self.upstream)
            .field("models", &self.models)
            .field("server", &self.server)
            .field("logging", &self.logging)
            .finish()
    }
}
