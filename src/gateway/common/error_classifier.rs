// Error classification module
// Maps reqwest failures and provider HTTP responses onto `GatewayError`

use reqwest::Error;
use serde_json::Value;

use crate::gateway::error::GatewayError;

/// Classify a request-level reqwest error and return (error_type, message).
///
/// - error_type: Used for logging
/// - message: Human-readable summary without URL or payload details
pub fn classify_request_error(error: &Error) -> (&'static str, &'static str) {
    if error.is_timeout() {
        ("timeout_error", "Request timeout, please check your network connection")
    } else if error.is_connect() {
        (
            "connection_error",
            "Connection failed, please check your network or proxy settings",
        )
    } else if error.is_decode() {
        ("decode_error", "Upstream response could not be decoded")
    } else if error.is_body() {
        ("body_error", "Upstream response body was interrupted")
    } else {
        ("unknown_error", "Unknown error occurred")
    }
}

/// Convert a reqwest error into a transport failure
pub fn transport_error_from(error: &Error) -> GatewayError {
    let (error_type, message) = classify_request_error(error);
    GatewayError::Transport {
        status: error.status().map(|s| s.as_u16()),
        message: format!("{}: {}", error_type, message),
    }
}

/// Classify a non-success provider response.
///
/// 401/403 and key-rejection 400s are authentication failures; everything
/// else is a transport failure carrying the status.
pub fn classify_http_failure(status: u16, body: &str) -> GatewayError {
    let message = extract_provider_message(body)
        .unwrap_or_else(|| describe_http_status(status).to_string());

    match status {
        401 | 403 => GatewayError::Auth(message),
        400 if is_key_rejection(body) => GatewayError::Auth(message),
        _ => GatewayError::transport_status(status, message),
    }
}

/// Short description for a provider status code
pub fn describe_http_status(status: u16) -> &'static str {
    match status {
        400 => "Request rejected by provider",
        401 => "API key missing or invalid",
        403 => "API key not permitted for this model",
        404 => "Model not available",
        408 => "Provider timed out",
        429 => "Rate limited by provider",
        500..=599 => "Provider server error",
        _ => "Unexpected HTTP error",
    }
}

/// Gemini reports a bad key as 400 INVALID_ARGUMENT with reason API_KEY_INVALID
fn is_key_rejection(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("api_key_invalid") || lower.contains("api key not valid")
}

/// Pull `error.message` out of a provider error envelope
fn extract_provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error").or_else(|| value.get(0).and_then(|v| v.get("error")))?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
