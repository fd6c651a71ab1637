//! Qwen MCP server
//!
//! Exposes Qwen chat and code generation as MCP tools over a line-delimited
//! JSON-RPC stdio transport, with completions served by OpenRouter.

pub mod completion;
pub mod config;
pub mod error;
pub mod mcp;

pub use config::CompletionConfig;
pub use error::{QwenError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
