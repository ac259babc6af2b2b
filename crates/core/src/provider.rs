//! Provider trait: the abstraction over LLM backends.
//!
//! A provider adapter knows how to send a role-tagged message list to one
//! LLM backend and return the generated text. It knows nothing about
//! fallback: ordering and failover belong to the dispatcher.
//!
//! Implementations: OpenAI-compatible, Anthropic, test stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ProviderError;
use crate::message::ChatMessage;

/// The core ProviderAdapter trait.
///
/// Adapters are shared across requests behind `Arc` and must be safe for
/// concurrent use.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable identifier used in priority lists and traces (e.g. "anthropic").
    fn id(&self) -> &str;

    /// Generate a completion for `messages`, finishing within `timeout`.
    async fn call(
        &self,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> std::result::Result<String, ProviderError>;
}

/// The answer returned by the fallback dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated text
    pub content: String,

    /// Which backend answered
    pub provider_id: String,

    /// True iff `provider_id` is not the first entry of the priority list
    pub fallback_used: bool,

    /// Wall-clock latency of the successful call
    pub latency_ms: u64,

    /// True when an earlier answer was rejected by the quality gate
    #[serde(default)]
    pub quality_fallback: bool,
}

/// Why a single candidate did not produce the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFailureKind {
    Timeout,
    RateLimited,
    Transport,
    Malformed,
    /// The request deadline expired before this candidate could be tried.
    DeadlineExceeded,
    /// The priority list names a provider that is not registered.
    NotRegistered,
}

impl std::fmt::Display for ProviderFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Transport => write!(f, "transport"),
            Self::Malformed => write!(f, "malformed"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::NotRegistered => write!(f, "not_registered"),
        }
    }
}

/// One entry of the per-candidate failure breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider_id: String,
    pub kind: ProviderFailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(
        provider_id: impl Into<String>,
        kind: ProviderFailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            kind,
            message: message.into(),
        }
    }
}
