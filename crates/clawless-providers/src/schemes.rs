//! Connection-string schemes.
//!
//! `llm.connectionString` has the form `scheme:model`. The scheme picks one
//! of the static specs below, which supply the default API base.

use thiserror::Error;

// ─────────────────────────────────────────────
// SchemeSpec
// ─────────────────────────────────────────────

/// Static description of one supported backend.
#[derive(Clone, Debug)]
pub struct SchemeSpec {
    /// Scheme as written in the connection string (lowercase).
    pub name: &'static str,
    /// Human-readable name for logs.
    pub display_name: &'static str,
    /// Base URL used when `llm.apiBase` is not set.
    pub default_api_base: &'static str,
}

/// All supported schemes.
pub static SCHEMES: &[SchemeSpec] = &[
    SchemeSpec {
        name: "openai",
        display_name: "OpenAI",
        default_api_base: "https://api.openai.com/v1",
    },
    SchemeSpec {
        name: "openrouter",
        display_name: "OpenRouter",
        default_api_base: "https://openrouter.ai/api/v1",
    },
];

/// Find a scheme spec by name, case-insensitively.
pub fn find_by_name(name: &str) -> Option<&'static SchemeSpec> {
    let name = name.to_lowercase();
    SCHEMES.iter().find(|spec| spec.name == name)
}

// ─────────────────────────────────────────────
// ConnectionString
// ─────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("connection_string must be scheme:model")]
    MissingSeparator,

    #[error("connection_string has an empty model name")]
    EmptyModel,

    #[error("Unsupported LLM scheme: {0}")]
    UnsupportedScheme(String),
}

/// A parsed `scheme:model` pair.
#[derive(Clone, Debug)]
pub struct ConnectionString {
    pub spec: &'static SchemeSpec,
    pub model: String,
}

impl ConnectionString {
    /// Split on the first `:`. The model part may itself contain colons.
    pub fn parse(value: &str) -> Result<Self, ConnectionStringError> {
        let (scheme, model) = value
            .split_once(':')
            .ok_or(ConnectionStringError::MissingSeparator)?;
        let spec = find_by_name(scheme.trim())
            .ok_or_else(|| ConnectionStringError::UnsupportedScheme(scheme.trim().to_lowercase()))?;
        let model = model.trim();
        if model.is_empty() {
            return Err(ConnectionStringError::EmptyModel);
        }
        Ok(Self {
            spec,
            model: model.to_string(),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
