//! Decision engine: the bounded tool-use state machine.
//!
//! One generation call decides between answering directly and requesting a
//! retrieval. A requested retrieval executes once, its result is appended
//! as a synthetic turn, and exactly one follow-up call — with tool access
//! disabled — synthesizes the final answer. The loop never runs a second
//! retrieval; [`Answer`] makes the two terminal paths structural.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::prompt;
use crate::providers::{ChatMessage, ChatRequest, GenerationError, Provider};
use crate::retrieval::RetrievalError;
use crate::sessions::Exchange;
use crate::tools::{ToolError, ToolRegistry};

/// Default output-length cap for generation calls.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// The final answer, tagged by which terminal path produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The model answered without requesting retrieval.
    Direct(String),
    /// One retrieval ran; the follow-up call synthesized the answer.
    Synthesized { text: String, sources: Vec<String> },
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Direct(text) => text,
            Answer::Synthesized { text, .. } => text,
        }
    }

    pub fn sources(&self) -> &[String] {
        match self {
            Answer::Direct(_) => &[],
            Answer::Synthesized { sources, .. } => sources,
        }
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        match self {
            Answer::Direct(text) => (text, Vec::new()),
            Answer::Synthesized { text, sources } => (text, sources),
        }
    }
}

/// Fatal failures of a `generate` call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Drives the generative capability through the two-path decision flow.
pub struct DecisionEngine {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl DecisionEngine {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            // Deterministic sampling: the retrieval decision should not
            // wobble between identical queries.
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_limits(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn request(&self, messages: Vec<ChatMessage>, tools: Option<&ToolRegistry>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            system: prompt::build_system_prompt(),
            messages,
            tools: tools.map(ToolRegistry::definitions).unwrap_or_default(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Produce the final answer for one query.
    ///
    /// At most one tool round-trip runs per call; a tool call requested in
    /// the follow-up response is not honored.
    pub async fn generate(
        &self,
        query: &str,
        history: &[Exchange],
        tools: Option<&ToolRegistry>,
    ) -> Result<Answer, EngineError> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 3);
        for exchange in history {
            messages.push(ChatMessage::User(exchange.query.clone()));
            messages.push(ChatMessage::Assistant(exchange.response.clone()));
        }
        messages.push(ChatMessage::User(query.to_string()));

        let response = self
            .provider
            .chat(&self.request(messages.clone(), tools))
            .await?;

        let Some(invocation) = response.tool_calls.into_iter().next() else {
            debug!("direct answer, no retrieval requested");
            let text = response.text.ok_or_else(|| {
                GenerationError::Malformed("response had neither text nor tool call".into())
            })?;
            return Ok(Answer::Direct(text));
        };

        let registry = tools.ok_or_else(|| {
            GenerationError::Malformed("tool call requested with no tools attached".into())
        })?;

        debug!(tool = %invocation.name, "executing requested tool");
        let (result_text, sources) = match registry
            .execute(&invocation.name, &invocation.arguments)
            .await
        {
            Ok(outcome) => (outcome.text, outcome.sources),
            Err(ToolError::Retrieval(err @ RetrievalError::IndexFault(_))) => {
                return Err(err.into());
            }
            Err(err) => {
                // Recoverable: the model reads the failure and answers anyway.
                warn!(tool = %invocation.name, error = %err, "tool execution failed");
                (format!("Tool execution failed: {err}"), Vec::new())
            }
        };

        let id = invocation.id.clone();
        messages.push(ChatMessage::ToolCall(invocation));
        messages.push(ChatMessage::ToolResult {
            id,
            content: result_text,
        });

        // Follow-up synthesis without tool access.
        let follow_up = self.provider.chat(&self.request(messages, None)).await?;
        if !follow_up.tool_calls.is_empty() {
            debug!("follow-up requested another tool call; not honored");
        }
        let text = follow_up.text.ok_or_else(|| {
            GenerationError::Malformed("follow-up response contained no text".into())
        })?;

        Ok(Answer::Synthesized { text, sources })
    }
}
