//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` REST endpoint:
//! - `x-goog-api-key` header authentication
//! - System prompt in `system_instruction`
//! - Assistant turns sent with the `model` role

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strata_core::{ChatMessage, ProviderAdapter, ProviderError, Role};
use tracing::debug;

use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiProvider {
    id: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 2048,
            temperature: 0.3,
            client: http::client(),
        }
    }

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

    fn request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Content<'_>> = Vec::new();

        for msg in messages {
            let role = match msg.role {
                Role::System => {
                    system_parts.push(&msg.content);
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(Content {
                role,
                parts: vec![Part { text: &msg.content }],
            });
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_tokens,
            },
        });
        if !system_parts.is_empty() {
            body["system_instruction"] = serde_json::json!({
                "parts": [{ "text": system_parts.join("\n\n") }],
            });
        }
        body
    }

    fn parse_response(&self, body: &str) -> Result<String, ProviderError> {
        let api_response: GeminiResponse = serde_json::from_str(body).map_err(|e| {
            ProviderError::Malformed(format!("{}: failed to parse response: {e}", self.id))
        })?;

        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

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
impl ProviderAdapter for GeminiProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(
        &self,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(provider = %self.id, model = %self.model, messages = messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .header("x-goog-api-key", &self.api_key)
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
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn system_goes_to_instruction_and_assistant_becomes_model() {
        let provider = GeminiProvider::new("g-key", DEFAULT_MODEL);
        let body = provider.request_body(&[
            ChatMessage::system("Persona line"),
            ChatMessage::user("What is L4?"),
            ChatMessage::assistant("Client data."),
            ChatMessage::user("And L5?"),
        ]);

        assert_eq!(body["system_instruction"]["parts"][0]["text"], "Persona line");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Client data.");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn no_instruction_without_system_message() {
        let provider = GeminiProvider::new("g-key", DEFAULT_MODEL);
        let body = provider.request_body(&[ChatMessage::user("hi")]);
        assert!(body.get("system_instruction").is_none());
    }

    #[test]
    fn parse_joins_first_candidate_parts() {
        let provider = GeminiProvider::new("g-key", DEFAULT_MODEL);
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]},"finishReason":"STOP"}],"usageMetadata":{"promptTokenCount":3}}"#;
        assert_eq!(provider.parse_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn blocked_response_is_malformed() {
        let provider = GeminiProvider::new("g-key", DEFAULT_MODEL);
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert!(matches!(
            provider.parse_response(body),
            Err(ProviderError::Malformed(_))
        ));
        assert!(matches!(
            provider.parse_response("not json"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn call_uses_generate_content_endpoint() {
        let (url, server) = test_support::serve_once(
            200,
            &[],
            r#"{"candidates":[{"content":{"parts":[{"text":"Answer"}]}}]}"#,
        )
        .await;
        let provider = GeminiProvider::new("g-key", "gemini-2.0-flash").with_base_url(url);

        let answer = provider
            .call(&[ChatMessage::user("q")], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(answer, "Answer");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /models/gemini-2.0-flash:generatecontent"));
        assert!(request.contains("x-goog-api-key: g-key"));
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let (url, _server) = test_support::serve_once(429, &[("retry-after", "7")], "{}").await;
        let provider = GeminiProvider::new("g-key", DEFAULT_MODEL).with_base_url(url);
        let err = provider
            .call(&[ChatMessage::user("q")], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after_secs: 7 }));
    }
}
