//! JSON-RPC client for one remote tool server.
//!
//! Each request is a single HTTP POST of
//! `{"jsonrpc": "2.0", "id": <n>, "method": <m>, "params": {...}}`.
//! Ids start at 1 and increase per client. A response carrying an `error`
//! field fails the call; otherwise its `result` (default `{}`) is returned
//! unchanged. No retries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use clawless_core::config::McpServerConfig;

use crate::tools::base::ToolArgs;

/// Per-request timeout.
pub const MCP_TIMEOUT_SECS: u64 = 30;

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum McpError {
    /// Connection, timeout or body read failure.
    #[error("MCP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("MCP server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("MCP response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The server answered with a JSON-RPC `error` object.
    #[error("MCP error: {0}")]
    Remote(Value),
}

// ─────────────────────────────────────────────
// McpClient
// ─────────────────────────────────────────────

pub struct McpClient {
    server: McpServerConfig,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("server", &self.server.name)
            .field("url", &self.server.url)
            .finish()
    }
}

impl McpClient {
    pub fn new(server: McpServerConfig) -> Result<Self, McpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(MCP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            server,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn server(&self) -> &McpServerConfig {
        &self.server
    }

    /// Send one request and return its `result`.
    pub async fn rpc(&self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(server = %self.server.name, method, id, "MCP request");

        let mut request = self.client.post(&self.server.url).json(&payload);
        if !self.server.bearer_token.is_empty() {
            request = request.bearer_auth(&self.server.bearer_token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(McpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = serde_json::from_str(&body)?;
        if let Some(error) = data.get("error") {
            return Err(McpError::Remote(error.clone()));
        }
        Ok(data.get("result").cloned().unwrap_or_else(|| json!({})))
    }

    /// Discover the server's tools.
    ///
    /// Reads `result.tools`, falling back to `result.result`; an absent or
    /// empty list yields no tools.
    pub async fn list_tools(&self) -> Result<Vec<Value>, McpError> {
        let result = self.rpc(&self.server.list_method, json!({})).await?;
        let tools = ["tools", "result"]
            .iter()
            .filter_map(|key| result.get(*key).and_then(Value::as_array))
            .find(|list| !list.is_empty())
            .cloned()
            .unwrap_or_default();
        Ok(tools)
    }

    /// Invoke one remote tool; the result is returned unmodified.
    pub async fn call_tool(&self, name: &str, arguments: ToolArgs) -> Result<Value, McpError> {
        self.rpc(
            &self.server.call_method,
            json!({ "name": name, "arguments": arguments }),
        )
        .await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
