//! Configuration loading for Banter.
//!
//! Resolves the data directory, reads `config.toml` from it, and pulls the
//! API key from the environment. Falls back to defaults when inputs are
//! missing or malformed.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use banter_types::config::ClientConfig;

/// Environment variable naming the API key for the completion endpoint.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `BANTER_DATA_DIR` environment variable
/// 2. `~/.banter` under the home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BANTER_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".banter");
    }

    // Last resort: current directory
    PathBuf::from(".banter")
}

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Read the API key from the environment.
///
/// Returns an empty secret when the variable is unset. Request construction
/// still succeeds with an empty key; the endpoint rejects it remotely, which
/// is where a missing credential surfaces.
pub fn resolve_api_key() -> SecretString {
    match std::env::var(API_KEY_ENV) {
        Ok(key) => SecretString::from(key),
        Err(_) => SecretString::from(String::new()),
    }
}
