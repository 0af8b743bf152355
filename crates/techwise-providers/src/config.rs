//! Provider configuration
//!
//! Values come from a TOML file, then the environment (a `.env` file is
//! loaded first when present), then built-in defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ENV_BASE_URL: &str = "TECHWISE_BASE_URL";
pub const ENV_MODEL: &str = "TECHWISE_MODEL";
pub const ENV_API_KEY: &str = "TECHWISE_API_KEY";

/// Settings for the OpenAI-compatible oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// API root, without the `/chat/completions` suffix
    pub base_url: String,

    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    pub timeout_secs: u64,

    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3.1:8b".to_string(),
            api_key_env: ENV_API_KEY.to_string(),
            timeout_secs: 120,
            headers: HashMap::new(),
        }
    }
}

impl OracleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Override `base_url` and `model` from `TECHWISE_BASE_URL` and
    /// `TECHWISE_MODEL` when they are set
    pub fn apply_env(mut self) -> Self {
        dotenvy::dotenv().ok();

        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Ok(model) = std::env::var(ENV_MODEL) {
            self.model = model;
        }
        self
    }

    /// API key read from `api_key_env`, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// Where the token counter gets its vocabulary from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Local `tokenizer.json`; takes precedence over `hf_repo`
    pub path: Option<PathBuf>,

    /// Hugging Face model repo to download `tokenizer.json` from
    pub hf_repo: Option<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            path: None,
            hf_repo: Some("google/flan-t5-base".to_string()),
        }
    }
}

impl TokenizerConfig {
    /// No model tokenizer; counts words
    pub fn whitespace() -> Self {
        Self {
            path: None,
            hf_repo: None,
        }
    }
}

/// Combined provider settings as stored in `techwise.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub oracle: OracleConfig,
    pub tokenizer: TokenizerConfig,
}

impl ProviderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse provider configuration")
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)?;
        config.oracle = config.oracle.apply_env();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert!(config.oracle.base_url.starts_with("http://"));
        assert_eq!(config.oracle.api_key_env, "TECHWISE_API_KEY");
        assert_eq!(config.tokenizer.path, None);
    }

    #[test]
    fn test_partial_toml() {
        let config = ProviderConfig::from_toml_str(
            r#"
            [oracle]
            model = "mistral"
            timeout_secs = 30

            [oracle.headers]
            "X-Team" = "helpdesk"

            [tokenizer]
            path = "models/tokenizer.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.oracle.model, "mistral");
        assert_eq!(config.oracle.timeout_secs, 30);
        assert_eq!(config.oracle.headers["X-Team"], "helpdesk");
        assert_eq!(config.oracle.base_url, OracleConfig::default().base_url);
        assert_eq!(
            config.tokenizer.path,
            Some(PathBuf::from("models/tokenizer.json"))
        );
        assert_eq!(config.tokenizer.hf_repo.as_deref(), Some("google/flan-t5-base"));
    }

    #[test]
    fn test_api_key_from_named_variable() {
        let config = OracleConfig {
            api_key_env: "TECHWISE_TEST_KEY_FOR_CONFIG".to_string(),
            ..OracleConfig::default()
        };
        assert_eq!(config.api_key(), None);

        std::env::set_var("TECHWISE_TEST_KEY_FOR_CONFIG", "sk-test");
        assert_eq!(config.api_key().as_deref(), Some("sk-test"));
        std::env::remove_var("TECHWISE_TEST_KEY_FOR_CONFIG");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ProviderConfig::load("/nonexistent/techwise.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
