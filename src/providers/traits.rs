//! Provider trait and chat wire types for model inference backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tools::ToolSpec;

/// One turn in a chat conversation.
///
/// `ToolCall`/`ToolResult` replay a completed tool round-trip so the
/// follow-up generation can see what was retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatMessage {
    User(String),
    Assistant(String),
    ToolCall(ToolInvocation),
    ToolResult { id: String, content: String },
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A single generation request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    /// Tool definitions advertised to the model. Empty disables tool use.
    pub tools: Vec<ToolSpec>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// The model's reply: text, a tool-use request, or both.
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ChatResponse {
    /// The first requested tool invocation, if any.
    pub fn tool_call(&self) -> Option<&ToolInvocation> {
        self.tool_calls.first()
    }
}

/// Failures of the external generative capability. Always fatal to the
/// in-flight query.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Opaque `(system prompt, history, optional tools) → text or tool call`
/// generative capability.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GenerationError>;

    /// The name of this provider implementation.
    fn name(&self) -> &str;
}
