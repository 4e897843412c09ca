use std::fs;
use std::path::{Path, PathBuf};

use crate::gateway::error::GatewayError;
use crate::models::GatewayConfig;

const DATA_DIR_NAME: &str = "grounded-gateway";
const CONFIG_FILE: &str = "config.json";

/// Environment variables consulted for the provider key, in priority order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Get data directory path (~/.local/share/grounded-gateway or platform equivalent)
pub fn get_data_dir() -> Result<PathBuf, GatewayError> {
    // Support custom data directory via environment variable
    if let Ok(env_path) = std::env::var("GROUNDED_GATEWAY_DATA_DIR") {
        if !env_path.trim().is_empty() {
            let data_dir = PathBuf::from(env_path);
            if !data_dir.exists() {
                fs::create_dir_all(&data_dir).map_err(|e| {
                    GatewayError::Config(format!("failed_to_create_custom_data_dir: {}", e))
                })?;
            }
            return Ok(data_dir);
        }
    }

    let base = dirs::data_dir()
        .ok_or_else(|| GatewayError::Config("failed_to_get_data_dir".to_string()))?;
    let data_dir = base.join(DATA_DIR_NAME);

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)
            .map_err(|e| GatewayError::Config(format!("failed_to_create_data_dir: {}", e)))?;
    }

    Ok(data_dir)
}

/// Load configuration from the data directory and apply env overrides
pub fn load_gateway_config() -> Result<GatewayConfig, GatewayError> {
    let data_dir = get_data_dir()?;
    let mut config = load_config_from(&data_dir)?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Load `config.json` from `dir`, writing defaults if it does not exist yet
pub fn load_config_from(dir: &Path) -> Result<GatewayConfig, GatewayError> {
    let config_path = dir.join(CONFIG_FILE);

    if !config_path.exists() {
        let config = GatewayConfig::new();
        // Persist so the user has a file to edit
        if let Err(e) = save_config_to(dir, &config) {
            tracing::warn!("Could not write default config: {}", e);
        }
        return Ok(config);
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|e| GatewayError::Config(format!("failed_to_read_config_file: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| GatewayError::Config(format!("failed_to_parse_config_file: {}", e)))
}

/// Save configuration to `dir/config.json`
pub fn save_config_to(dir: &Path, config: &GatewayConfig) -> Result<(), GatewayError> {
    let config_path = dir.join(CONFIG_FILE);

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| GatewayError::Config(format!("failed_to_serialize_config: {}", e)))?;

    fs::write(&config_path, content)
        .map_err(|e| GatewayError::Config(format!("failed_to_save_config: {}", e)))
}

/// Replace the file key with the first non-blank env key, if any.
///
/// `lookup` abstracts `std::env::var` so tests do not touch process state.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for name in API_KEY_ENV_VARS {
        if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("API key taken from ${}", name);
            config.api_key = Some(value.trim().to_string());
            return;
        }
    }
}
