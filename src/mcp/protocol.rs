//! MCP JSON-RPC protocol implementation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};

use crate::error::{QwenError, Result};

/// MCP protocol revision announced during `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name announced during `initialize`
pub const SERVER_NAME: &str = "qwen-mcp-server";

/// MCP JSON-RPC request
///
/// Built leniently from any JSON object: a missing `method` becomes the empty
/// string, a missing `id` becomes `null`, and `params` is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl McpRequest {
    /// Create a JSON-RPC 2.0 request
    pub fn new(id: Value, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: Some("2.0".to_string()),
            id,
            method: method.into(),
            params,
        }
    }

    /// Interpret a parsed JSON document as a request
    ///
    /// Only a non-object document is rejected; every field is optional and a
    /// non-string `method` is carried as its JSON text so it still reaches
    /// the unknown-method path.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            other => {
                return Err(QwenError::InvalidRequest(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let method = match obj.remove("method") {
            Some(Value::String(s)) => s,
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            jsonrpc: obj
                .remove("jsonrpc")
                .and_then(|v| v.as_str().map(str::to_string)),
            id: obj.remove("id").unwrap_or(Value::Null),
            method,
            params: obj.remove("params").unwrap_or(Value::Null),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    /// Echoed request id, `null` when the request could not be read
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError { code, message }),
        }
    }

    /// Create error from QwenError
    pub fn from_error(id: Value, err: QwenError) -> Self {
        Self::error(id, err.code(), err.to_string())
    }

    /// Last-resort response for faults outside the handler's control
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::from_error(Value::Null, QwenError::Internal(err.to_string()))
    }
}

/// MCP Server handling stdio communication
pub struct McpServer<H>
where
    H: McpHandler,
{
    handler: H,
}

/// Trait for handling MCP requests
pub trait McpHandler: Send + Sync {
    fn handle_request(&self, request: McpRequest) -> McpResponse;
}

impl<H: McpHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Run the server, reading from stdin and writing to stdout
    ///
    /// Stdout is not locked for the whole session: each response line takes
    /// the lock only while it is written, so a shutdown path can take it to
    /// wait for the line in flight.
    pub fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        self.serve(BufReader::new(stdin.lock()), std::io::stdout())
    }

    /// Serve requests from `reader` until EOF, one response line per input line
    pub fn serve<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let response = match std::str::from_utf8(&buf) {
                        Ok(line) => self.process_line(line),
                        Err(e) => McpResponse::from_error(
                            Value::Null,
                            QwenError::Parse(e.to_string()),
                        ),
                    };
                    write_response(&mut writer, &response)?;
                }
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    return Err(e.into());
                }
            }
        }

        tracing::debug!("stdin closed, stopping MCP server");
        Ok(())
    }

    /// Turn one input line into exactly one response
    pub fn process_line(&self, line: &str) -> McpResponse {
        let value: Value = match serde_json::from_str(line.trim()) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Rejecting malformed request line: {}", e);
                return McpResponse::from_error(Value::Null, QwenError::Parse(e.to_string()));
            }
        };

        match McpRequest::from_value(value) {
            Ok(request) => self.handler.handle_request(request),
            Err(e) => {
                tracing::warn!("Could not dispatch request: {}", e);
                McpResponse::internal(e)
            }
        }
    }
}

/// Write one response as a single flushed line
fn write_response<W: Write>(writer: &mut W, response: &McpResponse) -> Result<()> {
    let mut payload = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => serde_json::to_string(&McpResponse::internal(e))?,
    };
    payload.push('\n');
    writer.write_all(payload.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
}

/// JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Request method, resolved once per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method<'a> {
    Initialize,
    ListTools,
    CallTool,
    Unknown(&'a str),
}

impl<'a> Method<'a> {
    pub fn parse(method: &'a str) -> Self {
        match method {
            methods::INITIALIZE => Method::Initialize,
            methods::LIST_TOOLS => Method::ListTools,
            methods::CALL_TOOL => Method::CallTool,
            other => Method::Unknown(other),
        }
    }
}

/// MCP tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP initialize result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

/// Advertised as an empty object: tools are supported, the list never changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsCapability {}

/// Server info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability::default(),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }
}
