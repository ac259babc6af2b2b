//! OpenAI-compatible provider implementation.
//!
//! Works with OpenAI and any endpoint exposing `/chat/completions`
//! (OpenRouter, vLLM, Ollama, Together, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strata_core::{ChatMessage, ProviderAdapter, ProviderError};
use tracing::debug;

use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// An OpenAI-compatible chat completion adapter.
pub struct OpenAiCompatProvider {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        id: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 2048,
            temperature: 0.3,
            client: http::client(),
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", DEFAULT_BASE_URL, api_key, model)
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let messages: Vec<ApiMessage<'_>> = messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "stream": false,
        })
    }

    fn parse_response(&self, body: &str) -> Result<String, ProviderError> {
        let api_response: ApiResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::Malformed(format!("{}: failed to parse response: {e}", self.id))
        })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::Malformed(format!("{}: no choices in response", self.id))
            })?;

        if content.trim().is_empty() {
            return Err(ProviderError::Malformed(format!(
                "{}: empty completion",
                self.id
            )));
        }
        Ok(content)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(
        &self,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(provider = %self.id, model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(messages))
            .send()
            .await
            .map_err(|e| http::send_error(&self.id, e, timeout))?;

        let body = http::read_body(&self.id, response, timeout).await?;
        self.parse_response(&body)
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
