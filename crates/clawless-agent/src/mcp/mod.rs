//! Minimal MCP client: JSON-RPC 2.0 over HTTP POST.

pub mod client;

pub use client::{McpClient, McpError};
