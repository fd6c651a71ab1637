//! Error types for the Qwen MCP server

use thiserror::Error;

use crate::mcp::protocol::codes;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, QwenError>;

/// Main error type for the Qwen MCP server
#[derive(Error, Debug)]
pub enum QwenError {
    #[error("Parse error")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(feature = "openrouter")]
    Http(#[from] reqwest::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(not(feature = "openrouter"))]
    Http(String),

    #[error("OpenRouter API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QwenError {
    /// Check if the error came from talking to the completion backend
    pub fn is_upstream(&self) -> bool {
        matches!(self, QwenError::Http(_) | QwenError::Api { .. })
    }

    /// Get error code for MCP protocol
    pub fn code(&self) -> i64 {
        match self {
            QwenError::Parse(_) => codes::PARSE_ERROR,
            QwenError::UnknownMethod(_) | QwenError::UnknownTool(_) => {
                codes::METHOD_NOT_FOUND
            }
            _ => codes::INTERNAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_jsonrpc_table() {
        assert_eq!(QwenError::Parse("eof".into()).code(), -32700);
        assert_eq!(QwenError::UnknownMethod("x".into()).code(), -32601);
        assert_eq!(QwenError::UnknownTool("x".into()).code(), -32601);
        assert_eq!(QwenError::InvalidRequest("x".into()).code(), -32603);
        assert_eq!(QwenError::Internal("x".into()).code(), -32603);
    }

    #[test]
    fn test_messages_match_wire_format() {
        assert_eq!(QwenError::Parse("eof".into()).to_string(), "Parse error");
        assert_eq!(
            QwenError::UnknownTool("nope".into()).to_string(),
            "Unknown tool: nope"
        );
        assert_eq!(
            QwenError::Api {
                status: 429,
                body: "slow down".into()
            }
            .to_string(),
            "OpenRouter API returned 429: slow down"
        );
    }
}
