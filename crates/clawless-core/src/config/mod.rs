//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use clawless_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Model: {}", cfg.llm.connection_string);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{
    active_hours_contains, normalize_mcp_servers, parse_active_hours, AgentConfig, Config,
    HeartbeatConfig, LlmConfig, McpServerConfig, PathsConfig, DEFAULT_HEARTBEAT_PROMPT,
};
