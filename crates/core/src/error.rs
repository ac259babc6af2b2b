//! Error types for the Strata domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; only [`Error`] ever reaches
//! the caller of the pipeline.

use thiserror::Error;

use crate::provider::{ProviderFailure, ProviderFailureKind};

/// The top-level error type surfaced by the pipeline.
///
/// Layer and provider failures are recoverable and never appear here
/// directly; they are folded into the context bundle or into
/// [`AllProvidersFailed`].
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors (fatal, request construction) ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Request validation (surfaced as bad request) ---
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // --- Tenant resolution (surfaced as access denied) ---
    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    // --- Terminal dispatch failure (surfaced as service unavailable) ---
    #[error(transparent)]
    AllProvidersFailed(#[from] AllProvidersFailed),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A failure from a single provider adapter call.
///
/// Retries, if any, are the adapter's own business; the dispatcher treats
/// every variant as "advance to the next candidate".
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// The failure kind recorded by the dispatcher for this error.
    pub fn kind(&self) -> ProviderFailureKind {
        match self {
            Self::Timeout(_) => ProviderFailureKind::Timeout,
            Self::RateLimited { .. } => ProviderFailureKind::RateLimited,
            Self::Transport(_) => ProviderFailureKind::Transport,
            Self::Malformed(_) => ProviderFailureKind::Malformed,
        }
    }
}

/// A failure from a single knowledge layer fetch.
#[derive(Debug, Clone, Error)]
pub enum LayerError {
    #[error("Layer backend error: {0}")]
    Backend(String),

    #[error("Layer query rejected: {0}")]
    InvalidQuery(String),
}

/// Every provider in the priority list was tried and none produced an answer.
#[derive(Debug, Clone, Error)]
#[error("All {} providers failed: {}", failures.len(), summarize(failures))]
pub struct AllProvidersFailed {
    /// One entry per candidate, in call order.
    pub failures: Vec<ProviderFailure>,
}

fn summarize(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}={}", f.provider_id, f.kind))
        .collect::<Vec<_>>()
        .join(", ")
}
