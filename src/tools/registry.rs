//! Tool registry: name-keyed lookup and dispatch.

use serde_json::Value;

use super::traits::{Tool, ToolError, ToolOutcome, ToolSpec};

/// Registered tools, advertised to the model and dispatched by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. A tool re-registered under an existing name
    /// replaces the earlier registration.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    /// Specs for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "echoes its arguments"
        }
        fn parameters_schema(&self) -> Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, arguments: &Value) -> Result<ToolOutcome, ToolError> {
            Ok(ToolOutcome::text_only(arguments.to_string()))
        }
    }

    #[tokio::test]
    async fn executes_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool { name: "echo" }));

        let outcome = registry
            .execute("echo", &serde_json::json!({"k": 1}))
            .await
            .unwrap();
        assert_eq!(outcome.text, r#"{"k":1}"#);
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("missing", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "missing"));
    }

    #[test]
    fn definitions_follow_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool { name: "a" }));
        registry.register(Box::new(EchoTool { name: "b" }));

        let names: Vec<String> = registry.definitions().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn re_registration_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool { name: "a" }));
        registry.register(Box::new(EchoTool { name: "a" }));
        assert_eq!(registry.len(), 1);
    }
}
