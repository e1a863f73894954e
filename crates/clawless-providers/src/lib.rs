//! LLM client layer for Clawless.
//!
//! # Architecture
//!
//! - [`traits::LlmClient`] — the `invoke(messages) -> text` contract
//! - [`schemes`] — `scheme:model` connection strings and their static specs
//! - [`http_provider::HttpProvider`] — OpenAI-compatible HTTP client
//! - [`http_provider::create_provider`] — convenience builder from the `llm` config section

pub mod http_provider;
pub mod schemes;
pub mod traits;

// Re-export main types for convenience
pub use http_provider::{create_provider, HttpProvider};
pub use schemes::{ConnectionString, ConnectionStringError, SchemeSpec, SCHEMES};
pub use traits::LlmClient;
