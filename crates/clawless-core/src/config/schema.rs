//! Configuration schema.
//!
//! Hierarchy: `Config` → `LlmConfig`, `PathsConfig`, `McpServerConfig`,
//! `HeartbeatConfig`, `AgentConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::utils::{absolutize, expand_home};

/// Prompt sent to the agent on every heartbeat tick.
pub const DEFAULT_HEARTBEAT_PROMPT: &str = "You are running a heartbeat check. \
If HEARTBEAT.md exists, read it. \
Identify anything that needs the user's attention. \
If nothing needs attention, reply exactly with HEARTBEAT_OK.";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `<config_root>/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub llm: LlmConfig,
    pub paths: PathsConfig,
    pub mcp_servers: Vec<McpServerConfig>,
    pub heartbeat: HeartbeatConfig,
    pub agent: AgentConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            paths: PathsConfig::default(),
            mcp_servers: Vec::new(),
            heartbeat: HeartbeatConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Config {
    /// Remote tool servers that have both a name and a URL.
    pub fn normalized_mcp_servers(&self) -> Vec<McpServerConfig> {
        normalize_mcp_servers(&self.mcp_servers)
    }
}

// ─────────────────────────────────────────────
// LLM
// ─────────────────────────────────────────────

/// Language-model connection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    /// `scheme:model`, e.g. `openrouter:anthropic/claude-3.5-sonnet`.
    pub connection_string: String,
    /// Bearer key for the endpoint.
    pub api_key: String,
    /// Custom API base URL (overrides the scheme default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl LlmConfig {
    /// Whether both the connection string and key are present.
    pub fn is_configured(&self) -> bool {
        !self.connection_string.is_empty() && !self.api_key.is_empty()
    }
}

// ─────────────────────────────────────────────
// Paths
// ─────────────────────────────────────────────

/// The three sandbox roots, as written in the config file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathsConfig {
    pub config_root: String,
    pub internal_root: String,
    pub shared_root: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_root: "./config".to_string(),
            internal_root: "./internal".to_string(),
            shared_root: "./shared".to_string(),
        }
    }
}

impl PathsConfig {
    /// Expand `~` and make every root absolute.
    pub fn coerce(&mut self) {
        for root in [
            &mut self.config_root,
            &mut self.internal_root,
            &mut self.shared_root,
        ] {
            let abs = absolutize(&expand_home(root));
            *root = abs.to_string_lossy().to_string();
        }
    }

    pub fn config_root(&self) -> PathBuf {
        absolutize(&expand_home(&self.config_root))
    }

    pub fn internal_root(&self) -> PathBuf {
        absolutize(&expand_home(&self.internal_root))
    }

    pub fn shared_root(&self) -> PathBuf {
        absolutize(&expand_home(&self.shared_root))
    }

    /// SQLite database location.
    pub fn database_path(&self) -> PathBuf {
        self.internal_root().join("clawless.db")
    }

    /// Create the roots plus `internal/skills` and `shared/logs`.
    pub fn ensure(&self) -> std::io::Result<()> {
        for root in [self.config_root(), self.internal_root(), self.shared_root()] {
            std::fs::create_dir_all(root)?;
        }
        std::fs::create_dir_all(self.internal_root().join("skills"))?;
        std::fs::create_dir_all(self.shared_root().join("logs"))?;
        Ok(())
    }
}

// ─────────────────────────────────────────────
// MCP servers
// ─────────────────────────────────────────────

/// One remote tool server. Maps to one `mcp:<name>:*` namespace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McpServerConfig {
    pub name: String,
    pub url: String,
    pub bearer_token: String,
    /// Discovery method name.
    pub list_method: String,
    /// Invocation method name.
    pub call_method: String,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            url: String::new(),
            bearer_token: String::new(),
            list_method: "tools/list".to_string(),
            call_method: "tools/call".to_string(),
        }
    }
}

/// Drop server entries missing a name or URL.
pub fn normalize_mcp_servers(servers: &[McpServerConfig]) -> Vec<McpServerConfig> {
    servers
        .iter()
        .filter(|s| !s.name.is_empty() && !s.url.is_empty())
        .cloned()
        .collect()
}

// ─────────────────────────────────────────────
// Heartbeat
// ─────────────────────────────────────────────

/// Periodic unattended check.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartbeatConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
    /// `HH:MM-HH:MM` in local time. Absent means always active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_hours: Option<String>,
    pub prompt: String,
    /// Relative to the shared root.
    pub checklist_path: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 30,
            active_hours: None,
            prompt: DEFAULT_HEARTBEAT_PROMPT.to_string(),
            checklist_path: "HEARTBEAT.md".to_string(),
        }
    }
}

/// Parse `HH:MM-HH:MM` into minutes since midnight.
pub fn parse_active_hours(value: &str) -> anyhow::Result<(u32, u32)> {
    fn minutes(part: &str) -> Option<u32> {
        let (h, m) = part.trim().split_once(':')?;
        let h: u32 = h.trim().parse().ok()?;
        let m: u32 = m.trim().parse().ok()?;
        if h >= 24 || m >= 60 {
            return None;
        }
        h.checked_mul(60)?.checked_add(m)
    }

    let (start, end) = value
        .split_once('-')
        .context("active_hours must be HH:MM-HH:MM")?;
    let start = minutes(start).context("active_hours must be HH:MM-HH:MM")?;
    let end = minutes(end).context("active_hours must be HH:MM-HH:MM")?;
    Ok((start, end))
}

/// Whether `minute_of_day` falls inside the window.
///
/// A window whose start is after its end wraps past midnight.
pub fn active_hours_contains(value: Option<&str>, minute_of_day: u32) -> anyhow::Result<bool> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(true);
    };
    let (start, end) = parse_active_hours(value)?;
    if start <= end {
        Ok(start <= minute_of_day && minute_of_day <= end)
    } else {
        Ok(minute_of_day >= start || minute_of_day <= end)
    }
}

// ─────────────────────────────────────────────
// Agent
// ─────────────────────────────────────────────

/// Conversation defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// How many recent messages are replayed each turn.
    pub history_limit: usize,
    /// Track used when a message has no selector and nothing is active.
    pub default_track: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            default_track: "default".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
