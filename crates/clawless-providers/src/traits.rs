//! LLM client trait: the only contract the agent core depends on.
//!
//! Vendor protocol, endpoint and authentication all live behind
//! [`LlmClient::invoke`]. The `HttpProvider` in `http_provider.rs` covers
//! every OpenAI-compatible API.

use async_trait::async_trait;
use clawless_core::types::Message;

/// Text-in, text-out language model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send an ordered message list and return the completion text.
    ///
    /// Transport and API failures are returned as errors; the caller decides
    /// how to surface them.
    async fn invoke(&self, messages: &[Message]) -> anyhow::Result<String>;

    /// Display name for logging.
    fn display_name(&self) -> &str {
        "llm"
    }
}
