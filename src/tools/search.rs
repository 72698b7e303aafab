//! Course content search tool.
//!
//! The one retrieval capability advertised to the model. Course-not-found
//! is deliberately a *normal* tool result, not an error: the model has to
//! be able to read it and react.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;

use super::traits::{Tool, ToolError, ToolOutcome};
use crate::retrieval::{RetrievalBackend, RetrievalError, SearchResult};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Semantic search over course materials with optional course/lesson filters.
pub struct CourseSearchTool {
    backend: Arc<RetrievalBackend>,
}

impl CourseSearchTool {
    pub fn new(backend: Arc<RetrievalBackend>) -> Self {
        Self { backend }
    }

    fn parse_lesson_number(arguments: &Value) -> Result<Option<u32>, ToolError> {
        match arguments.get("lesson_number") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                let n = value.as_u64().ok_or_else(|| {
                    ToolError::InvalidArguments(format!(
                        "'lesson_number' must be a non-negative integer, got {value}"
                    ))
                })?;
                Ok(Some(u32::try_from(n).map_err(|_| {
                    ToolError::InvalidArguments(format!("'lesson_number' out of range: {n}"))
                })?))
            }
        }
    }

    fn empty_result_text(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
        let mut text = String::from("No relevant content found");
        if let Some(course) = course_name {
            let _ = write!(text, " in course '{course}'");
        }
        if let Some(lesson) = lesson_number {
            let _ = write!(text, " in lesson {lesson}");
        }
        text.push('.');
        text
    }

    fn format_results(results: &[SearchResult]) -> ToolOutcome {
        let mut blocks = Vec::with_capacity(results.len());
        let mut sources = Vec::with_capacity(results.len());
        for result in results {
            let header = match result.lesson_number {
                Some(n) => format!("[{} - Lesson {}]", result.course_title, n),
                None => format!("[{}]", result.course_title),
            };
            blocks.push(format!("{header}\n{}", result.content));
            sources.push(result.source_descriptor());
        }
        ToolOutcome {
            text: blocks.join("\n\n"),
            sources,
        }
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search course materials for content relevant to a question. \
         Optionally restrict to a specific course (by approximate name) \
         and/or lesson number."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for in the course content"
                },
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial names accepted, e.g. 'MCP')"
                },
                "lesson_number": {
                    "type": "integer",
                    "description": "Specific lesson number to search within"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: &Value) -> Result<ToolOutcome, ToolError> {
        let query = arguments
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| {
                ToolError::InvalidArguments("missing required parameter 'query'".into())
            })?;
        let course_name = arguments
            .get("course_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let lesson_number = Self::parse_lesson_number(arguments)?;

        match self
            .backend
            .resolve_and_search(query, course_name, lesson_number, None)
            .await
        {
            Ok(results) if results.is_empty() => Ok(ToolOutcome::text_only(
                Self::empty_result_text(course_name, lesson_number),
            )),
            Ok(results) => Ok(Self::format_results(&results)),
            Err(RetrievalError::CourseNotFound { name }) => Ok(ToolOutcome::text_only(format!(
                "No course found matching '{name}'"
            ))),
            Err(fault) => Err(fault.into()),
        }
    }
}
