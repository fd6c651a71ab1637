//! Text completion backends used by the MCP tools
//!
//! Supports two backends:
//! - OpenRouter chat completions API (Qwen model) - requires `openrouter` feature
//! - Offline canned responses (no external dependencies)
//!
//! Backends never fail from the caller's point of view: every problem is
//! folded into the returned text with an `"Error: "` prefix, so tool output
//! stays a plain string.
//!
//! # Feature Flags
//!
//! - `openrouter`: Enables the OpenRouter backend (requires API key)

mod offline;
#[cfg(feature = "openrouter")]
mod openrouter;

pub use offline::OfflineClient;
#[cfg(feature = "openrouter")]
pub use openrouter::OpenRouterClient;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{Backend, CompletionConfig};
use crate::error::{QwenError, Result};

/// Token budget for conversational replies
pub const CHAT_MAX_TOKENS: u32 = 1000;

/// Token budget for code generation, which tends to run longer
pub const CODE_MAX_TOKENS: u32 = 1500;

/// Author of a chat message; both tools send a single user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

/// One role/content pair of a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Trait for completion generators
pub trait CompletionClient: Send + Sync {
    /// Generate a reply for the conversation, or an `"Error: ..."` description
    fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> String;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Create a completion client from configuration
///
/// Available backends depend on enabled features:
/// - `Backend::Offline`: Always available
/// - `Backend::OpenRouter`: Requires `openrouter` feature; a missing API key
///   is not an error here, calls report it instead
pub fn create_client(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>> {
    match config.backend {
        #[cfg(feature = "openrouter")]
        Backend::OpenRouter => Ok(Arc::new(OpenRouterClient::new(config)?)),
        #[cfg(not(feature = "openrouter"))]
        Backend::OpenRouter => Err(QwenError::Config(
            "OpenRouter backend requires the `openrouter` feature".to_string(),
        )),
        Backend::Offline => Ok(Arc::new(OfflineClient::new())),
    }
}

/// Render a backend failure as tool output text
#[cfg_attr(not(feature = "openrouter"), allow(dead_code))]
pub(crate) fn describe_failure(err: &QwenError) -> String {
    match err {
        QwenError::Http(e) => format!("Error: OpenRouter API call failed: {}", e),
        QwenError::Config(msg) | QwenError::Internal(msg) => format!("Error: {}", msg),
        other => format!("Error: {}", other),
    }
}
