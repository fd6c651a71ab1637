//! OpenRouter chat completions backend
//!
//! Supports OpenRouter and other OpenAI-compatible chat completion APIs.
//! Requests run on a private current-thread runtime, so `complete` must not
//! be called from inside another tokio runtime.

use serde_json::{json, Value};
use tokio::runtime::Runtime;

use super::{describe_failure, ChatMessage, CompletionClient};
use crate::config::{CompletionConfig, API_KEY_ENV};
use crate::error::{QwenError, Result};

/// OpenRouter completion client
pub struct OpenRouterClient {
    client: reqwest::Client,
    runtime: Runtime,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OpenRouterClient {
    /// Create a client from configuration
    ///
    /// The configured timeout bounds the whole request, including reading the
    /// response body.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            client,
            runtime,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Async chat completion call to the OpenRouter API
    pub async fn complete_async(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| QwenError::Config(format!("{} not configured", API_KEY_ENV)))?;

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            // OpenRouter uses these to attribute traffic
            .header("HTTP-Referer", "https://github.com/qwen-mcp-server")
            .header("X-Title", "Qwen MCP Server")
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": max_tokens,
                "temperature": self.temperature,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(QwenError::Api { status, body });
        }

        let data: Value = response.json().await?;
        extract_content(&data)
    }
}

/// Pull the first choice's message text out of a chat completion payload
fn extract_content(data: &Value) -> Result<String> {
    data["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            QwenError::Internal("OpenRouter API returned an unexpected payload".to_string())
        })
}

impl CompletionClient for OpenRouterClient {
    fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> String {
        tracing::debug!(model = %self.model, max_tokens, "Calling OpenRouter");

        match self.runtime.block_on(self.complete_async(messages, max_tokens)) {
            Ok(text) => text,
            Err(e) => {
                if e.is_upstream() {
                    tracing::warn!("OpenRouter request failed: {}", e);
                }
                describe_failure(&e)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
