//! Clawless Agent — the propose/resolve loop and its tools.
//!
//! This crate contains:
//! - **tools**: Tool trait, registry, and the file, skill and MCP providers
//! - **mcp**: the JSON-RPC client for remote tool servers
//! - **tool_call**: tool-call detection in model output
//! - **agent**: the two-phase loop and the tool audit hook

pub mod agent;
pub mod mcp;
pub mod tool_call;
pub mod tools;

pub use agent::{Agent, AuditStatus, ToolAuditor};
pub use tool_call::{parse_tool_call, ToolCall};
pub use tools::{build_tools, Tool, ToolArgs, ToolRegistry};
