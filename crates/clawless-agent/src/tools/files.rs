//! File tools — read, write and list under the shared root.
//!
//! Every path goes through [`PathSandbox::resolve_shared`] before any I/O,
//! so a rejected path never touches the filesystem. Read and write results
//! carry the SHA-256 of the UTF-8 payload.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use clawless_core::paths::PathSandbox;

use super::base::{parse_args, Tool, ToolArgs};
use super::registry::ToolRegistry;

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// Registers `read_file`, `write_file` and `list_dir`.
pub struct FileTools {
    sandbox: Arc<PathSandbox>,
}

impl FileTools {
    pub fn new(sandbox: Arc<PathSandbox>) -> Self {
        Self { sandbox }
    }

    pub fn register(&self, registry: &mut ToolRegistry) {
        registry.register(Arc::new(ReadFileTool {
            sandbox: self.sandbox.clone(),
        }));
        registry.register(Arc::new(WriteFileTool {
            sandbox: self.sandbox.clone(),
        }));
        registry.register(Arc::new(ListDirTool {
            sandbox: self.sandbox.clone(),
        }));
    }
}

fn resolve(sandbox: &PathSandbox, relative: &str) -> anyhow::Result<PathBuf> {
    Ok(sandbox.resolve_shared(relative)?)
}

// ─────────────────────────────────────────────
// ReadFileTool
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: String,
}

pub struct ReadFileTool {
    sandbox: Arc<PathSandbox>,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file from shared_root."
    }

    fn input_schema(&self) -> Value {
        json!({ "path": "relative path under shared_root" })
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
        let args: ReadArgs = match parse_args(self.name(), args) {
            Ok(a) => a,
            Err(invalid) => return Ok(invalid),
        };
        let path = resolve(&self.sandbox, &args.path)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        debug!(path = %path.display(), bytes = content.len(), "read file");

        Ok(json!({
            "path": path.to_string_lossy(),
            "sha256": sha256_hex(content.as_bytes()),
            "content": content,
        }))
    }
}

// ─────────────────────────────────────────────
// WriteFileTool
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: String,
    #[serde(default)]
    content: Value,
}

/// Strings are written as-is, null as empty, anything else as its JSON text.
fn content_text(content: Value) -> String {
    match content {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub struct WriteFileTool {
    sandbox: Arc<PathSandbox>,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write a text file to shared_root (overwrite)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "path": "relative path under shared_root",
            "content": "full file content",
        })
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
        let args: WriteArgs = match parse_args(self.name(), args) {
            Ok(a) => a,
            Err(invalid) => return Ok(invalid),
        };
        let path = resolve(&self.sandbox, &args.path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = content_text(args.content);
        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), bytes = content.len(), "wrote file");

        Ok(json!({
            "path": path.to_string_lossy(),
            "sha256": sha256_hex(content.as_bytes()),
        }))
    }
}

// ─────────────────────────────────────────────
// ListDirTool
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default = "current_dir")]
    path: String,
}

fn current_dir() -> String {
    ".".to_string()
}

pub struct ListDirTool {
    sandbox: Arc<PathSandbox>,
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List entries under a directory in shared_root."
    }

    fn input_schema(&self) -> Value {
        json!({ "path": "relative path under shared_root" })
    }

    async fn execute(&self, args: ToolArgs) -> anyhow::Result<Value> {
        let args: ListArgs = match parse_args(self.name(), args) {
            Ok(a) => a,
            Err(invalid) => return Ok(invalid),
        };
        let path = resolve(&self.sandbox, &args.path)?;
        if !path.exists() {
            return Ok(json!({ "path": path.to_string_lossy(), "entries": [] }));
        }

        let mut entries: Vec<(String, bool)> = std::fs::read_dir(&path)
            .with_context(|| format!("Failed to list {}", path.display()))?
            .filter_map(|e| e.ok())
            .map(|e| {
                let is_dir = e.path().is_dir();
                (e.file_name().to_string_lossy().to_string(), is_dir)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let entries: Vec<Value> = entries
            .into_iter()
            .map(|(name, is_dir)| json!({ "name": name, "is_dir": is_dir }))
            .collect();
        Ok(json!({ "path": path.to_string_lossy(), "entries": entries }))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clawless_core::paths::PathRoots;
    use tempfile::TempDir;

    fn make_registry() -> (TempDir, Arc<PathSandbox>, ToolRegistry) {
        let dir = tempfile::tempdir().unwrap();
        for name in ["config", "internal", "shared"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        let roots = PathRoots::new(
            dir.path().join("config"),
            dir.path().join("internal"),
            dir.path().join("shared"),
        )
        .unwrap();
        let sandbox = Arc::new(PathSandbox::new(roots));
        let mut registry = ToolRegistry::new();
        FileTools::new(sandbox.clone()).register(&mut registry);
        (dir, sandbox, registry)
    }

    fn args(value: Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    async fn call(registry: &ToolRegistry, name: &str, value: Value) -> anyhow::Result<Value> {
        registry.get(name).unwrap().execute(args(value)).await
    }

    #[test]
    fn test_registers_three_tools() {
        let (_dir, _sandbox, registry) = make_registry();
        assert_eq!(registry.tool_names(), vec!["list_dir", "read_file", "write_file"]);
    }

    #[tokio::test]
    async fn test_write_then_read_digest_matches() {
        let (_dir, sandbox, registry) = make_registry();
        let written = call(&registry, "write_file", json!({"path": "notes/a.txt", "content": "hello"}))
            .await
            .unwrap();
        let read = call(&registry, "read_file", json!({"path": "notes/a.txt"}))
            .await
            .unwrap();

        assert_eq!(read["content"], "hello");
        assert_eq!(written["sha256"], read["sha256"]);
        assert_eq!(
            read["sha256"],
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        let expected = sandbox.roots().shared_root.join("notes/a.txt");
        assert_eq!(read["path"], &*expected.to_string_lossy());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (dir, _sandbox, registry) = make_registry();
        call(&registry, "write_file", json!({"path": "f.txt", "content": "long content"}))
            .await
            .unwrap();
        call(&registry, "write_file", json!({"path": "f.txt", "content": "x"}))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("shared/f.txt")).unwrap(), "x");
    }

    #[tokio::test]
    async fn test_write_coerces_non_string_content() {
        let (dir, _sandbox, registry) = make_registry();
        call(&registry, "write_file", json!({"path": "n.json", "content": {"a": 1}}))
            .await
            .unwrap();
        call(&registry, "write_file", json!({"path": "empty.txt"}))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("shared/n.json")).unwrap(), r#"{"a":1}"#);
        assert_eq!(std::fs::read_to_string(dir.path().join("shared/empty.txt")).unwrap(), "");
    }

    #[tokio::test]
    async fn test_escape_fails_before_io() {
        let (dir, _sandbox, registry) = make_registry();
        let err = call(&registry, "write_file", json!({"path": "../config/evil.txt", "content": "x"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Path escapes sandbox root"));
        assert!(!dir.path().join("config/evil.txt").exists());
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let (_dir, _sandbox, registry) = make_registry();
        assert!(call(&registry, "read_file", json!({"path": "nope.txt"})).await.is_err());
    }

    #[tokio::test]
    async fn test_read_invalid_args_is_structured() {
        let (_dir, _sandbox, registry) = make_registry();
        let result = call(&registry, "read_file", json!({"path": 7})).await.unwrap();
        assert_eq!(result["error"], "invalid arguments");
        assert_eq!(result["tool"], "read_file");
    }

    #[tokio::test]
    async fn test_list_dir_sorted() {
        let (dir, _sandbox, registry) = make_registry();
        std::fs::create_dir_all(dir.path().join("shared/zdir")).unwrap();
        std::fs::write(dir.path().join("shared/b.txt"), "").unwrap();
        std::fs::write(dir.path().join("shared/a.txt"), "").unwrap();

        let result = call(&registry, "list_dir", json!({})).await.unwrap();
        let entries = result["entries"].as_array().unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "zdir"]);
        assert_eq!(entries[2]["is_dir"], true);
        assert_eq!(entries[0]["is_dir"], false);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let (_dir, _sandbox, registry) = make_registry();
        let result = call(&registry, "list_dir", json!({"path": "missing"})).await.unwrap();
        assert_eq!(result["entries"], json!([]));
    }
}
