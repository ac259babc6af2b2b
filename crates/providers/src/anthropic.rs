//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as a top-level field

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strata_core::{ChatMessage, ProviderAdapter, ProviderError, Role};
use tracing::debug;

use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.3,
            client: http::client(),
        }
    }

    /// Register under a different id (e.g. two Anthropic models side by side).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Anthropic puts the system prompt in a top-level field, not in messages.
    fn extract_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut rest: Vec<&ChatMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => rest.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };
        (system, rest)
    }

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let (system, rest) = Self::extract_system(messages);
        let api_messages: Vec<ApiMessage<'_>> = rest
            .into_iter()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": api_messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        if let Some(system) = system {
            body["system"] = serde_json::json!(system);
        }
        body
    }

    fn parse_response(&self, body: &str) -> Result<String, ProviderError> {
        let api_response: AnthropicResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::Malformed(format!("{}: failed to parse response: {e}", self.id))
        })?;

        let text: String = api_response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderError::Malformed(format!(
                "{}: response has no text content",
                self.id
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(
        &self,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(provider = %self.id, model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn system_messages_are_lifted_out() {
        let provider = AnthropicProvider::new("sk-ant", "claude-sonnet-4-20250514");
        let body = provider.request_body(&[
            ChatMessage::system("Persona line"),
            ChatMessage::user("What is L4?"),
            ChatMessage::assistant("Client data."),
            ChatMessage::user("And L5?"),
        ]);
        assert_eq!(body["system"], "Persona line");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[test]
    fn no_system_field_without_system_message() {
        let provider = AnthropicProvider::new("sk-ant", "claude");
        let body = provider.request_body(&[ChatMessage::user("hi")]);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn parse_joins_text_blocks() {
        let provider = AnthropicProvider::new("sk-ant", "claude");
        let body = r#"{"content":[{"type":"text","text":"Hello "},{"type":"text","text":"world"}],"stop_reason":"end_turn"}"#;
        assert_eq!(provider.parse_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn parse_without_text_is_malformed() {
        let provider = AnthropicProvider::new("sk-ant", "claude");
        assert!(matches!(
            provider.parse_response(r#"{"content":[]}"#),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn call_uses_messages_endpoint_and_headers() {
        let (url, server) = test_support::serve_once(
            200,
            &[],
            r#"{"content":[{"type":"text","text":"Answer"}]}"#,
        )
        .await;
        let provider = AnthropicProvider::new("sk-ant", "claude").with_base_url(url);

        let answer = provider
            .call(&[ChatMessage::user("q")], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(answer, "Answer");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /v1/messages"));
        assert!(request.contains("x-api-key: sk-ant"));
        assert!(request.contains("anthropic-version: 2023-06-01"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_transport() {
        let (url, _server) = test_support::serve_once(401, &[], "{}").await;
        let provider = AnthropicProvider::new("bad", "claude").with_base_url(url);
        let err = provider
            .call(&[ChatMessage::user("q")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
