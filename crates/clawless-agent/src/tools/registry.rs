//! Tool Registry — name-keyed catalogue populated once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::base::Tool;

// ─────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────

/// Stores tools keyed by name.
///
/// Owns `Arc<dyn Tool>` so tools can be shared across tasks.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Overwrites any previous tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if self.tools.contains_key(tool.name()) {
            info!(tool = tool.name(), "replaced tool");
        } else {
            info!(tool = tool.name(), "registered tool");
        }
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tools, sorted by name.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Names of all registered tools, sorted for determinism.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::base::ToolArgs;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    /// Minimal tool with a configurable name and description.
    struct NamedTool {
        name: &'static str,
        description: &'static str,
    }

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            self.description
        }
        fn input_schema(&self) -> Value {
            json!({})
        }
        async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
            Ok(Value::Object(args))
        }
    }

    fn tool(name: &'static str, description: &'static str) -> Arc<dyn Tool> {
        Arc::new(NamedTool { name, description })
    }

    #[test]
    fn test_register_and_get() {
        let mut reg = ToolRegistry::new();
        reg.register(tool("echo", "Echo"));
        assert!(reg.get("echo").is_some());
        assert!(reg.get("nope").is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_register_last_writer_wins() {
        let mut reg = ToolRegistry::new();
        reg.register(tool("echo", "first"));
        reg.register(tool("echo", "second"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("echo").unwrap().description(), "second");
    }

    #[test]
    fn test_list_sorted_regardless_of_order() {
        let mut reg = ToolRegistry::new();
        reg.register(tool("write_file", ""));
        reg.register(tool("mcp:a:search", ""));
        reg.register(tool("list_dir", ""));
        let names: Vec<String> = reg.list().iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["list_dir", "mcp:a:search", "write_file"]);
        assert_eq!(reg.tool_names(), names);
    }

    #[tokio::test]
    async fn test_get_returns_callable_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(tool("echo", "Echo"));
        let args = json!({"text": "hi"}).as_object().cloned().unwrap();
        let result = reg.get("echo").unwrap().execute(args).await.unwrap();
        assert_eq!(result, json!({"text": "hi"}));
    }

    #[test]
    fn test_default() {
        let reg = ToolRegistry::default();
        assert!(reg.is_empty());
    }
}
