//! HTTP LLM client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Covers both supported schemes (OpenAI and OpenRouter); they differ only
//! in the default API base.

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use clawless_core::config::LlmConfig;
use clawless_core::types::Message;

use crate::schemes::{ConnectionString, SchemeSpec};
use crate::traits::LlmClient;

/// Request timeout for one completion.
const REQUEST_TIMEOUT_S: u64 = 120;

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// LLM client talking to one OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    model: String,
    spec: &'static SchemeSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpProvider {
    /// Create a client for `spec`. `api_base` overrides the spec default.
    pub fn new(
        spec: &'static SchemeSpec,
        model: &str,
        api_key: &str,
        api_base: Option<&str>,
    ) -> anyhow::Result<Self> {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or(spec.default_api_base)
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_S))
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpProvider {
            client,
            api_base,
            api_key: api_key.to_string(),
            model: model.to_string(),
            spec,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl LlmClient for HttpProvider {
    async fn invoke(&self, messages: &[Message]) -> anyhow::Result<String> {
        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            messages = messages.len(),
            "Calling LLM"
        );

        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                anyhow::anyhow!("Error calling LLM: {e}")
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %error_text,
                "API error"
            );
            bail!("Error calling LLM: {} {}", status, error_text);
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("Error parsing LLM response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .context("LLM response has no choices")?
            .message
            .content
            .unwrap_or_default();

        debug!(
            provider = self.spec.display_name,
            length = content.len(),
            "LLM response received"
        );
        Ok(content)
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an `HttpProvider` from the `llm` config section.
///
/// Both the connection string and the API key must be set.
pub fn create_provider(config: &LlmConfig) -> anyhow::Result<HttpProvider> {
    if !config.is_configured() {
        bail!("LLM connection_string and api_key must be configured");
    }
    let cs = ConnectionString::parse(&config.connection_string)?;

    debug!(
        provider = cs.spec.display_name,
        model = %cs.model,
        api_base = config.api_base.as_deref().unwrap_or("default"),
        "Creating LLM provider"
    );

    HttpProvider::new(cs.spec, &cs.model, &config.api_key, config.api_base.as_deref())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
