//! Offline completion backend
//!
//! Returns deterministic canned text instead of calling a model. Used when the
//! server runs without network access and as the backend for end-to-end tests.

use super::{ChatMessage, CompletionClient, Role};

/// Canned-response completion client
#[derive(Debug, Default, Clone)]
pub struct OfflineClient;

impl OfflineClient {
    pub fn new() -> Self {
        Self
    }
}

impl CompletionClient for OfflineClient {
    fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> String {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        format!(
            "[offline] Qwen is not reachable from this server (max_tokens={}). Prompt was: {}",
            max_tokens, prompt
        )
    }

    fn model_name(&self) -> &str {
        "offline"
    }
}
