//! OpenAI-compatible chat completions provider.
//!
//! Most hosted LLM APIs follow the same `/v1/chat/completions` format, so a
//! single implementation covers OpenAI itself plus compatible gateways and
//! local servers behind a custom base URL.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sanitize_api_error;
use super::traits::{
    ChatMessage, ChatRequest, ChatResponse, GenerationError, Provider, ToolInvocation,
};
use crate::tools::ToolSpec;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A provider that speaks the OpenAI-compatible chat completions API.
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    pub fn with_base_url(base_url: Option<&str>, api_key: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.map(ToString::to_string),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Build the chat completions URL, tolerating a base URL that already
    /// names the full endpoint.
    fn chat_completions_url(&self) -> String {
        if self
            .base_url
            .trim_end_matches('/')
            .ends_with("/chat/completions")
        {
            self.base_url.clone()
        } else {
            format!("{}/chat/completions", self.base_url)
        }
    }

    fn wire_messages(request: &ChatRequest) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(WireMessage::text("system", &request.system));
        for message in &request.messages {
            match message {
                ChatMessage::User(text) => messages.push(WireMessage::text("user", text)),
                ChatMessage::Assistant(text) => messages.push(WireMessage::text("assistant", text)),
                ChatMessage::ToolCall(invocation) => messages.push(WireMessage {
                    role: "assistant",
                    content: None,
                    tool_calls: Some(vec![WireToolCall::from_invocation(invocation)]),
                    tool_call_id: None,
                }),
                ChatMessage::ToolResult { id, content } => messages.push(WireMessage {
                    role: "tool",
                    content: Some(content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(id.clone()),
                }),
            }
        }
        messages
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &'static str, content: &str) -> Self {
        Self {
            role,
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolFunction,
}

impl From<&ToolSpec> for WireTool {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            kind: "function",
            function: WireToolFunction {
                name: spec.name.clone(),
                description: Some(spec.description.clone()),
                parameters: Some(spec.parameters.clone()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    function: Option<WireToolFunctionCall>,
}

impl WireToolCall {
    fn from_invocation(invocation: &ToolInvocation) -> Self {
        Self {
            id: Some(invocation.id.clone()),
            kind: Some("function".to_string()),
            function: Some(WireToolFunctionCall {
                name: Some(invocation.name.clone()),
                arguments: Some(invocation.arguments.to_string()),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireToolFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolFunctionCall {
    name: Option<String>,
    /// JSON-encoded argument object, per the chat completions wire format.
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

fn parse_tool_call(call: WireToolCall) -> Result<ToolInvocation, GenerationError> {
    let function = call
        .function
        .ok_or_else(|| GenerationError::Malformed("tool call without function".into()))?;
    let name = function
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| GenerationError::Malformed("tool call without function name".into()))?;
    let arguments = match function.arguments.as_deref() {
        None | Some("") => serde_json::json!({}),
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            GenerationError::Malformed(format!("unparseable tool arguments: {e}"))
        })?,
    };
    Ok(ToolInvocation {
        id: call.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name,
        arguments,
    })
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError> {
        let body = WireRequest {
            model: request.model.clone(),
            messages: Self::wire_messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(request.tools.iter().map(WireTool::from).collect())
            },
        };

        let mut http = self.client.post(self.chat_completions_url()).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            return Err(GenerationError::Api {
                provider: self.name().to_string(),
                status,
                message: sanitize_api_error(&text),
            });
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let message = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Malformed("response contained no choices".into()))?
            .message;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ChatResponse {
            text: message.content.filter(|c| !c.trim().is_empty()),
            tool_calls,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
