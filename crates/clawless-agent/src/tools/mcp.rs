//! MCP tool loader — one `mcp:<server>:<tool>` entry per discovered tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use clawless_core::config::McpServerConfig;

use super::base::{Tool, ToolArgs};
use super::registry::ToolRegistry;
use crate::mcp::{McpClient, McpError};

/// One tool as advertised by the server's discovery call.
#[derive(Clone, Debug, PartialEq)]
pub struct McpToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl McpToolSpec {
    /// `None` when the entry has no name.
    fn from_value(tool: &Value) -> Option<Self> {
        let name = tool.get("name").and_then(Value::as_str).unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        let description = tool
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let input_schema = tool
            .get("inputSchema")
            .or_else(|| tool.get("input_schema"))
            .filter(|s| !s.is_null())
            .cloned()
            .unwrap_or_else(|| json!({}));
        Some(Self {
            name: name.to_string(),
            description,
            input_schema,
        })
    }
}

// ─────────────────────────────────────────────
// Loader (provider)
// ─────────────────────────────────────────────

pub struct McpToolLoader {
    client: Arc<McpClient>,
}

impl McpToolLoader {
    pub fn new(server: McpServerConfig) -> Result<Self, McpError> {
        Ok(Self {
            client: Arc::new(McpClient::new(server)?),
        })
    }

    pub async fn list_tool_specs(&self) -> Result<Vec<McpToolSpec>, McpError> {
        let tools = self.client.list_tools().await?;
        Ok(tools.iter().filter_map(McpToolSpec::from_value).collect())
    }

    /// Discover once and register every tool. Returns how many were registered.
    pub async fn register(&self, registry: &mut ToolRegistry) -> Result<usize, McpError> {
        let specs = self.list_tool_specs().await?;
        let server = &self.client.server().name;
        let count = specs.len();
        for spec in specs {
            let description = if spec.description.is_empty() {
                format!("MCP tool {}", spec.name)
            } else {
                spec.description
            };
            registry.register(Arc::new(McpTool {
                full_name: format!("mcp:{}:{}", server, spec.name),
                remote_name: spec.name,
                description,
                input_schema: spec.input_schema,
                client: self.client.clone(),
            }));
        }
        info!(server = %server, tools = count, "loaded MCP server");
        Ok(count)
    }
}

// ─────────────────────────────────────────────
// McpTool
// ─────────────────────────────────────────────

/// Forwards calls to the remote server unchanged.
pub struct McpTool {
    full_name: String,
    remote_name: String,
    description: String,
    input_schema: Value,
    client: Arc<McpClient>,
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.full_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
        debug!(tool = %self.full_name, "forwarding MCP call");
        Ok(self.client.call_tool(&self.remote_name, args).await?)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(name: &str, url: String) -> McpServerConfig {
        McpServerConfig {
            name: name.into(),
            url,
            ..Default::default()
        }
    }

    async fn mount_tools(server: &MockServer, tools: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "tools/list" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "tools": tools }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_register_namespaces_and_defaults() {
        let server = MockServer::start().await;
        mount_tools(
            &server,
            json!([
                { "name": "search", "description": "Search docs", "inputSchema": { "type": "object" } },
                { "name": "fetch", "input_schema": { "url": "string" } },
                { "description": "nameless" }
            ]),
        )
        .await;

        let loader = McpToolLoader::new(config("docs", server.uri())).unwrap();
        let mut registry = ToolRegistry::new();
        let count = loader.register(&mut registry).await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(registry.tool_names(), vec!["mcp:docs:fetch", "mcp:docs:search"]);
        let search = registry.get("mcp:docs:search").unwrap();
        assert_eq!(search.description(), "Search docs");
        assert_eq!(search.input_schema(), json!({ "type": "object" }));
        let fetch = registry.get("mcp:docs:fetch").unwrap();
        assert_eq!(fetch.description(), "MCP tool fetch");
        assert_eq!(fetch.input_schema(), json!({ "url": "string" }));
    }

    #[tokio::test]
    async fn test_tool_forwards_call_with_remote_name() {
        let server = MockServer::start().await;
        mount_tools(&server, json!([{ "name": "search" }])).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": { "name": "search", "arguments": { "q": "x" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "hits": 3 }
            })))
            .mount(&server)
            .await;

        let loader = McpToolLoader::new(config("docs", server.uri())).unwrap();
        let mut registry = ToolRegistry::new();
        loader.register(&mut registry).await.unwrap();

        let args = json!({ "q": "x" }).as_object().cloned().unwrap();
        let result = registry.get("mcp:docs:search").unwrap().execute(args).await.unwrap();
        assert_eq!(result, json!({ "hits": 3 }));
    }

    #[tokio::test]
    async fn test_discovery_failure_registers_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let loader = McpToolLoader::new(config("broken", server.uri())).unwrap();
        let mut registry = ToolRegistry::new();
        assert!(loader.register(&mut registry).await.is_err());
        assert!(registry.is_empty());
    }
}
