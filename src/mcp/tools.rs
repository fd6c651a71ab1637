//! MCP tool definitions for the Qwen server
//!
//! The tool set is closed: [`ToolName`] lists every tool, [`TOOL_DEFINITIONS`]
//! holds their advertised metadata in `tools/list` order, and [`ToolCall`]
//! turns a `tools/call` invocation into a completion request.

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};

use super::protocol::ToolDefinition;
use crate::completion::{ChatMessage, CHAT_MAX_TOKENS, CODE_MAX_TOKENS};
use crate::error::{QwenError, Result};

/// Every tool the server knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    QwenChat,
    QwenCode,
}

impl ToolName {
    pub const ALL: [ToolName; 2] = [ToolName::QwenChat, ToolName::QwenCode];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::QwenChat => "qwen_chat",
            ToolName::QwenCode => "qwen_code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

/// All tool definitions, in the order `tools/list` reports them
pub const TOOL_DEFINITIONS: &[(ToolName, &str, &str)] = &[
    (
        ToolName::QwenChat,
        "Chat with Qwen AI model",
        r#"{
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Message to send to Qwen"}
            },
            "required": ["message"]
        }"#,
    ),
    (
        ToolName::QwenCode,
        "Generate code with Qwen AI",
        r#"{
            "type": "object",
            "properties": {
                "prompt": {"type": "string", "description": "Code generation prompt"},
                "language": {"type": "string", "description": "Programming language"}
            },
            "required": ["prompt"]
        }"#,
    ),
];

static TOOL_REGISTRY: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.as_str().to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
});

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> &'static [ToolDefinition] {
    &TOOL_REGISTRY
}

/// Defaults applied to absent tool arguments
pub mod defaults {
    pub const MESSAGE: &str = "";
    pub const PROMPT: &str = "";
    pub const LANGUAGE: &str = "python";
}

/// `tools/call` parameters: which tool, with what arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Read `params.name` and `params.arguments`, defaulting anything missing
    /// or of the wrong shape
    pub fn from_params(params: &Value) -> Self {
        let name = match params.get("name") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let arguments = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        Self { name, arguments }
    }
}

/// Accept any JSON value for a string field: `null` means absent, other
/// non-strings are kept as their JSON text
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Arguments of `qwen_chat`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatArgs {
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
}

/// Arguments of `qwen_code`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CodeArgs {
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub language: Option<String>,
}

fn decode_args<T: DeserializeOwned + Default>(tool: ToolName, arguments: Map<String, Value>) -> T {
    serde_json::from_value(Value::Object(arguments)).unwrap_or_else(|e| {
        tracing::warn!("Falling back to default arguments for {}: {}", tool.as_str(), e);
        T::default()
    })
}

/// Outbound request for the completion backend
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// A resolved tool call with decoded arguments
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Chat(ChatArgs),
    Code(CodeArgs),
}

impl ToolCall {
    /// Resolve an invocation against the registry
    pub fn resolve(invocation: ToolInvocation) -> Result<Self> {
        let tool = ToolName::from_name(&invocation.name)
            .ok_or(QwenError::UnknownTool(invocation.name))?;

        Ok(match tool {
            ToolName::QwenChat => ToolCall::Chat(decode_args(tool, invocation.arguments)),
            ToolName::QwenCode => ToolCall::Code(decode_args(tool, invocation.arguments)),
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            ToolCall::Chat(_) => ToolName::QwenChat,
            ToolCall::Code(_) => ToolName::QwenCode,
        }
    }

    /// Build the completion request this tool sends
    pub fn completion_request(&self) -> CompletionRequest {
        match self {
            ToolCall::Chat(args) => {
                let message = args.message.as_deref().unwrap_or(defaults::MESSAGE);
                CompletionRequest {
                    messages: vec![ChatMessage::user(message)],
                    max_tokens: CHAT_MAX_TOKENS,
                }
            }
            ToolCall::Code(args) => {
                let prompt = args.prompt.as_deref().unwrap_or(defaults::PROMPT);
                let language = args.language.as_deref().unwrap_or(defaults::LANGUAGE);
                CompletionRequest {
                    messages: vec![ChatMessage::user(code_prompt(language, prompt))],
                    max_tokens: CODE_MAX_TOKENS,
                }
            }
        }
    }
}

fn code_prompt(language: &str, prompt: &str) -> String {
    format!(
        "Generate {} code for: {}\n\nPlease provide only the code without explanations.",
        language, prompt
    )
}
