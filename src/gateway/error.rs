// Gateway error taxonomy
//
// Hard failures only. The "image operation returned no image" case is a
// successful `OperationResult` with `empty_result_warning` set.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request failed field validation; nothing was sent upstream
    #[error("invalid request: {0}")]
    Validation(String),

    /// No API key configured, or the provider rejected it
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network, timeout, decode or non-auth provider failure
    #[error("upstream transport failed{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Caller cancelled while the call was in flight
    #[error("request cancelled")]
    Cancelled,

    /// Configuration could not be loaded or saved
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Opaque classification safe to log or return to clients
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Auth(_) => "auth_error",
            Self::Transport { .. } => "transport_error",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config_error",
        }
    }

    /// Whether a caller-side retry could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status, .. } => match status {
                None => true,
                Some(s) => *s == 408 || *s == 429 || *s >= 500,
            },
            Self::Cancelled => true,
            _ => false,
        }
    }
}
