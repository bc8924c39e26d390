//! Configuration loader for Confab.
//!
//! Reads `config.toml` from the data directory (`~/.confab/` in
//! production) and deserializes it into [`AppConfig`]. Falls back to
//! sensible defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

/// Default base URL of the chat API.
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// Default base URL of the OpenAI-compatible assistant endpoint.
const DEFAULT_ASSISTANT_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration, section per remote collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub assistant: AssistantConfig,
}

/// Chat history and report API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Assistant generation settings.
///
/// Without an `api_key` the generator reports a missing credential and
/// the engine falls back to its apology reply; the rest of the app keeps
/// working.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ASSISTANT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

/// The default data directory: `~/.confab`.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".confab")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.api.request_timeout_secs, 30);
        assert!(config.assistant.api_key.is_none());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
[api]
base_url = "https://chat.example.com/api"

[assistant]
model = "gpt-4o"
api_key = "sk-test"
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.api.base_url, "https://chat.example.com/api");
        // Unset fields keep their defaults.
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.assistant.model, "gpt-4o");
        assert_eq!(
            config.assistant.api_key.unwrap().expose_secret(),
            "sk-test"
        );
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
    }
}
