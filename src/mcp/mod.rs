//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC over stdio for AI tool integration.

pub mod handler;
pub mod protocol;
pub mod tools;

pub use handler::QwenHandler;
pub use protocol::{
    codes, methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer, Method,
    ToolCallResult,
};
pub use tools::{get_tool_definitions, ToolCall, ToolInvocation, ToolName, TOOL_DEFINITIONS};
