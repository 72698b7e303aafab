//! Tool trait and execution types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retrieval::RetrievalError;

/// Declared tool surface advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

/// The result of one tool execution: the text fed back to the model plus
/// the source descriptors backing it.
///
/// Sources travel with the outcome instead of through shared mutable state,
/// so concurrent queries cannot observe each other's attributions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutcome {
    pub text: String,
    pub sources: Vec<String>,
}

impl ToolOutcome {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

/// Tool execution failures.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

impl ToolError {
    /// Whether this failure must abort the whole query. Argument and
    /// unknown-tool errors are fed back to the model as text instead;
    /// an index fault has no textual recovery.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ToolError::Retrieval(RetrievalError::IndexFault(_)))
    }
}

/// An agent-callable capability with a declared parameter schema.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute with JSON arguments, returning the formatted result text and
    /// any source descriptors it is based on.
    async fn execute(&self, arguments: &serde_json::Value) -> Result<ToolOutcome, ToolError>;

    /// Build the spec advertised to the model.
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
