//! Request dispatch for the Qwen MCP server

use std::sync::Arc;

use serde_json::{json, Value};

use super::protocol::{
    InitializeResult, McpHandler, McpRequest, McpResponse, Method, ToolCallResult,
};
use super::tools::{get_tool_definitions, ToolCall, ToolInvocation};
use crate::completion::CompletionClient;
use crate::error::{QwenError, Result};

/// MCP request handler backed by a completion client
pub struct QwenHandler {
    client: Arc<dyn CompletionClient>,
}

impl QwenHandler {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn handle_tool_call(&self, params: &Value) -> Result<ToolCallResult> {
        let call = ToolCall::resolve(ToolInvocation::from_params(params))?;
        let request = call.completion_request();

        tracing::debug!(
            tool = call.tool().as_str(),
            model = self.client.model_name(),
            max_tokens = request.max_tokens,
            "Dispatching tool call"
        );

        // Backend failures come back as "Error: ..." text and are passed through
        let text = self.client.complete(&request.messages, request.max_tokens);
        Ok(ToolCallResult::text(text))
    }
}

impl McpHandler for QwenHandler {
    fn handle_request(&self, request: McpRequest) -> McpResponse {
        match Method::parse(&request.method) {
            Method::Initialize => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            Method::ListTools => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({ "tools": tools }))
            }
            Method::CallTool => match self.handle_tool_call(&request.params) {
                Ok(result) => McpResponse::success(request.id, json!(result)),
                Err(e) => McpResponse::from_error(request.id, e),
            },
            Method::Unknown(method) => {
                let err = QwenError::UnknownMethod(method.to_string());
                McpResponse::from_error(request.id, err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{ChatMessage, OfflineClient};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed string
    struct RecordingClient {
        reply: String,
        calls: Mutex<Vec<(Vec<ChatMessage>, u32)>>,
    }

    impl RecordingClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(Vec<ChatMessage>, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CompletionClient for RecordingClient {
        fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> String {
            self.calls
                .lock()
                .unwrap()
                .push((messages.to_vec(), max_tokens));
            self.reply.clone()
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    fn request(id: Value, method: &str, params: Value) -> McpRequest {
        McpRequest::new(id, method, params)
    }

    #[test]
    fn test_initialize_ignores_params() {
        let handler = QwenHandler::new(Arc::new(OfflineClient::new()));
        let plain = handler.handle_request(request(json!(1), "initialize", Value::Null));
        let noisy = handler.handle_request(request(
            json!(1),
            "initialize",
            json!({"protocolVersion": "1999-01-01", "clientInfo": {"name": "x"}}),
        ));
        assert_eq!(plain, noisy);
        let result = plain.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "qwen-mcp-server");
    }

    #[test]
    fn test_tools_list() {
        let handler = QwenHandler::new(Arc::new(OfflineClient::new()));
        let resp = handler.handle_request(request(json!("list"), "tools/list", json!({})));
        assert_eq!(resp.id, json!("list"));
        assert!(resp.error.is_none());
        let tools = resp.result.unwrap()["tools"].clone();
        let tools = tools.as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "qwen_chat");
        assert_eq!(tools[1]["name"], "qwen_code");
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[test]
    fn test_chat_call_passes_collaborator_text_through() {
        let client = RecordingClient::new("Hi there!");
        let handler = QwenHandler::new(client.clone());
        let resp = handler.handle_request(request(
            json!(5),
            "tools/call",
            json!({"name": "qwen_chat", "arguments": {"message": "hello"}}),
        ));

        assert!(resp.error.is_none());
        assert_eq!(
            resp.result.unwrap(),
            json!({"content": [{"type": "text", "text": "Hi there!"}]})
        );
        assert_eq!(client.calls(), vec![(vec![ChatMessage::user("hello")], 1000)]);
    }

    #[test]
    fn test_collaborator_error_text_is_still_a_result() {
        let client = RecordingClient::new("Error: OPENROUTER_API_KEY not configured");
        let handler = QwenHandler::new(client);
        let resp = handler.handle_request(request(
            json!(6),
            "tools/call",
            json!({"name": "qwen_chat", "arguments": {"message": "hello"}}),
        ));
        assert!(resp.error.is_none());
        assert_eq!(
            resp.result.unwrap()["content"][0]["text"],
            "Error: OPENROUTER_API_KEY not configured"
        );
    }

    #[test]
    fn test_code_call_uses_larger_budget() {
        let client = RecordingClient::new("package main");
        let handler = QwenHandler::new(client.clone());
        handler.handle_request(request(
            json!(7),
            "tools/call",
            json!({"name": "qwen_code", "arguments": {"prompt": "sort a list", "language": "go"}}),
        ));

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        let (messages, max_tokens) = &calls[0];
        assert_eq!(*max_tokens, 1500);
        assert!(messages[0].content.contains("go"));
        assert!(messages[0].content.contains("sort a list"));
    }

    #[test]
    fn test_call_without_arguments() {
        let client = RecordingClient::new("ok");
        let handler = QwenHandler::new(client.clone());
        let params = json!({"name": "qwen_chat"});
        let resp = handler.handle_request(request(json!(8), "tools/call", params));
        assert!(resp.error.is_none());
        assert_eq!(client.calls()[0].0, vec![ChatMessage::user("")]);
    }

    #[test]
    fn test_unknown_tool() {
        let client = RecordingClient::new("unused");
        let handler = QwenHandler::new(client.clone());
        let resp = handler.handle_request(request(
            json!(9),
            "tools/call",
            json!({"name": "qwen_vision", "arguments": {}}),
        ));
        assert_eq!(resp.id, json!(9));
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Unknown tool: qwen_vision");
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_call_with_missing_or_odd_params() {
        let handler = QwenHandler::new(Arc::new(OfflineClient::new()));
        for params in [Value::Null, json!([]), json!("qwen_chat"), json!({})] {
            let resp = handler.handle_request(request(json!(10), "tools/call", params));
            let error = resp.error.unwrap();
            assert_eq!(error.code, -32601);
            assert_eq!(error.message, "Unknown tool: ");
        }
    }

    #[test]
    fn test_unknown_method() {
        let handler = QwenHandler::new(Arc::new(OfflineClient::new()));
        let resp = handler.handle_request(request(json!(11), "resources/list", json!({})));
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Unknown method: resources/list");
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_missing_method_is_unknown() {
        let handler = QwenHandler::new(Arc::new(OfflineClient::new()));
        let req = McpRequest::from_value(json!({"id": 12})).unwrap();
        let resp = handler.handle_request(req);
        assert_eq!(resp.id, json!(12));
        assert_eq!(resp.error.unwrap().message, "Unknown method: ");
    }
}
