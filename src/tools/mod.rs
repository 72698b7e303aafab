//! Tool subsystem for model-callable capabilities.
//!
//! Each tool implements the [`Tool`] trait defined in [`traits`]: a name,
//! description, JSON parameter schema, and an async `execute` returning a
//! [`ToolOutcome`] that carries both the text fed back to the model and the
//! source descriptors backing it. Tools are assembled into a [`ToolRegistry`]
//! by [`default_tools`].

pub mod registry;
pub mod search;
pub mod traits;

pub use registry::ToolRegistry;
pub use search::CourseSearchTool;
pub use traits::{Tool, ToolError, ToolOutcome, ToolSpec};

use crate::retrieval::RetrievalBackend;
use std::sync::Arc;

/// Create the default tool registry: the course content search tool.
pub fn default_tools(backend: Arc<RetrievalBackend>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CourseSearchTool::new(backend)));
    registry
}
