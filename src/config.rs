//! Runtime configuration for the completion backend
//!
//! Built once at startup (from CLI flags / environment in the server binary)
//! and handed to [`crate::completion::create_client`].

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::QwenError;

/// OpenRouter API base URL
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Qwen model served through OpenRouter
pub const DEFAULT_MODEL: &str = "qwen/qwen3-coder:free";

/// Sampling temperature sent with every completion request
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Upper bound on a single completion call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the OpenRouter credential
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Which completion backend answers tool calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Remote OpenRouter chat completions API
    #[default]
    OpenRouter,
    /// Deterministic canned text, no network access
    Offline,
}

impl FromStr for Backend {
    type Err = QwenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(Backend::OpenRouter),
            "offline" => Ok(Backend::Offline),
            other => Err(QwenError::Config(format!(
                "unknown backend '{}', expected 'openrouter' or 'offline'",
                other
            ))),
        }
    }
}

/// Completion client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub backend: Backend,
    /// OpenRouter API key; absence is reported per call, not at startup
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Offline configuration, used by tests and air-gapped hosts
    pub fn offline() -> Self {
        Self {
            backend: Backend::Offline,
            ..Self::default()
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::OpenRouter,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_openrouter_setup() {
        let config = CompletionConfig::default();
        assert_eq!(config.backend, Backend::OpenRouter);
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "qwen/qwen3-coder:free");
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("openrouter".parse::<Backend>().unwrap(), Backend::OpenRouter);
        assert_eq!(" Offline ".parse::<Backend>().unwrap(), Backend::Offline);
        assert!("ollama".parse::<Backend>().is_err());
    }
}
