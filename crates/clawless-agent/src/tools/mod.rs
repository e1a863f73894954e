//! Tool modules for the Clawless agent.

pub mod base;
pub mod files;
pub mod mcp;
pub mod registry;
pub mod skills;

use std::sync::Arc;

use tracing::{error, info, warn};

use clawless_core::config::Config;
use clawless_core::paths::PathSandbox;

pub use base::{is_invalid_args, parse_args, Tool, ToolArgs, INVALID_ARGUMENTS};
pub use files::{sha256_hex, FileTools};
pub use mcp::{McpToolLoader, McpToolSpec};
pub use registry::ToolRegistry;
pub use skills::{SkillDefinition, SkillRunner};

/// Build the registry from every configured provider.
///
/// A provider that fails to initialise is logged and skipped; the others
/// still register.
pub async fn build_tools(sandbox: Arc<PathSandbox>, config: &Config) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    FileTools::new(sandbox.clone()).register(&mut registry);

    match SkillRunner::new(sandbox.clone()) {
        Ok(runner) => runner.register(&mut registry),
        Err(e) => warn!(error = %e, "skill runner unavailable"),
    }

    for server in config.normalized_mcp_servers() {
        let name = server.name.clone();
        let loader = match McpToolLoader::new(server) {
            Ok(loader) => loader,
            Err(e) => {
                error!(server = %name, error = %e, "failed to create MCP client");
                continue;
            }
        };
        if let Err(e) = loader.register(&mut registry).await {
            error!(server = %name, error = %e, "failed to load MCP tools");
        }
    }

    info!(tools = registry.len(), "tool registry ready");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawless_core::config::McpServerConfig;
    use clawless_core::paths::PathRoots;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sandbox(dir: &std::path::Path) -> Arc<PathSandbox> {
        for name in ["config", "internal", "shared"] {
            std::fs::create_dir_all(dir.join(name)).unwrap();
        }
        let roots =
            PathRoots::new(dir.join("config"), dir.join("internal"), dir.join("shared")).unwrap();
        Arc::new(PathSandbox::new(roots))
    }

    #[tokio::test]
    async fn test_failing_mcp_server_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let skill_dir = dir.path().join("internal/skills/echo");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("skill.json"),
            r#"{"name": "echo", "description": "Echo", "entrypoint": "builtin:echo"}"#,
        )
        .unwrap();

        let good = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "tools": [{ "name": "ping" }] }
            })))
            .mount(&good)
            .await;

        let mut config = Config::default();
        config.mcp_servers = vec![
            McpServerConfig {
                name: "down".into(),
                url: "http://127.0.0.1:1".into(),
                ..Default::default()
            },
            McpServerConfig {
                name: "up".into(),
                url: good.uri(),
                ..Default::default()
            },
        ];

        let registry = build_tools(sandbox(dir.path()), &config).await;
        assert_eq!(
            registry.tool_names(),
            vec!["echo", "list_dir", "mcp:up:ping", "read_file", "write_file"]
        );
    }
}
