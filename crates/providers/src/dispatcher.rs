//! LLM fallback dispatcher: ordered walk over the provider priority list.
//!
//! Each candidate is called at most once, strictly in order, under
//! `min(per-provider timeout, time left before the deadline)`. The first
//! success wins. Exhaustion yields [`AllProvidersFailed`] with exactly one
//! failure per priority entry, in call order.

use std::time::Duration;
use strata_config::QualityGateConfig;
use strata_core::{
    AllProvidersFailed, ChatMessage, ProviderError, ProviderFailure, ProviderFailureKind,
    ProviderResponse,
};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::registry::ProviderRegistry;

/// Content check applied to answers generated with client-specific context.
#[derive(Debug, Clone)]
pub struct QualityGate {
    min_chars: usize,
    reject_phrases: Vec<String>,
}

impl QualityGate {
    pub fn new(min_chars: usize, reject_phrases: Vec<String>) -> Self {
        Self {
            min_chars,
            reject_phrases,
        }
    }

    /// `None` when the gate is disabled.
    pub fn from_config(config: &QualityGateConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.min_chars, config.reject_phrases.clone()))
    }

    /// Why `content` is rejected, if it is.
    pub fn check(&self, content: &str) -> Option<String> {
        let chars = content.trim().chars().count();
        if chars < self.min_chars {
            return Some(format!("answer too short ({chars} chars)"));
        }
        self.reject_phrases
            .iter()
            .find(|phrase| content.contains(phrase.as_str()))
            .map(|phrase| format!("answer contains '{phrase}'"))
    }
}

/// An acceptable-but-rejected answer kept in case nothing better arrives.
struct HeldAnswer {
    index: usize,
    provider_id: String,
    content: String,
    latency_ms: u64,
}

/// Walks the priority list until one provider answers.
#[derive(Debug, Clone)]
pub struct FallbackDispatcher {
    registry: ProviderRegistry,
    quality_gate: Option<QualityGate>,
}

impl FallbackDispatcher {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            quality_gate: None,
        }
    }

    pub fn with_quality_gate(mut self, gate: Option<QualityGate>) -> Self {
        self.quality_gate = gate;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Generate an answer.
    ///
    /// `has_client_context` tells the dispatcher whether the prompt carried
    /// client-specific (L4) context; the quality gate only applies then.
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        provider_priority: &[String],
        deadline: Instant,
        has_client_context: bool,
    ) -> Result<ProviderResponse, AllProvidersFailed> {
        let mut failures = Vec::with_capacity(provider_priority.len());
        let mut held: Option<HeldAnswer> = None;
        let gate = self.quality_gate.as_ref().filter(|_| has_client_context);

        for (index, provider_id) in provider_priority.iter().enumerate() {
            let now = Instant::now();
            if now >= deadline {
                failures.push(ProviderFailure::new(
                    provider_id,
                    ProviderFailureKind::DeadlineExceeded,
                    "request deadline reached before this provider was tried",
                ));
                continue;
            }

            let Some(entry) = self.registry.get(provider_id) else {
                warn!(provider = %provider_id, "Provider not registered, skipping");
                failures.push(ProviderFailure::new(
                    provider_id,
                    ProviderFailureKind::NotRegistered,
                    "no adapter registered under this id",
                ));
                continue;
            };

            let budget = entry.timeout.min(deadline - now);
            info!(
                provider = %provider_id,
                attempt = index + 1,
                total = provider_priority.len(),
                timeout_ms = budget.as_millis() as u64,
                "Dispatch: trying provider"
            );

            let started = Instant::now();
            let outcome = match tokio::time::timeout(budget, entry.adapter.call(messages, budget))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(timed_out(provider_id, budget)),
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(content) => {
                    if let Some(reason) = gate.and_then(|g| g.check(&content)) {
                        warn!(
                            provider = %provider_id,
                            reason = %reason,
                            "Dispatch: answer rejected by quality gate, trying next"
                        );
                        if held.is_none() {
                            held = Some(HeldAnswer {
                                index,
                                provider_id: provider_id.clone(),
                                content,
                                latency_ms,
                            });
                        }
                        continue;
                    }

                    return Ok(ProviderResponse {
                        content,
                        provider_id: provider_id.clone(),
                        fallback_used: index > 0,
                        latency_ms,
                        quality_fallback: held.is_some(),
                    });
                }
                Err(e) => {
                    warn!(
                        provider = %provider_id,
                        kind = %e.kind(),
                        error = %e,
                        latency_ms,
                        "Dispatch: provider failed, trying next"
                    );
                    failures.push(ProviderFailure::new(provider_id, e.kind(), e.to_string()));
                }
            }
        }

        if let Some(held) = held {
            warn!(
                provider = %held.provider_id,
                "Dispatch: no better answer, returning the gated answer"
            );
            return Ok(ProviderResponse {
                content: held.content,
                provider_id: held.provider_id,
                fallback_used: held.index > 0,
                latency_ms: held.latency_ms,
                quality_fallback: false,
            });
        }

        Err(AllProvidersFailed { failures })
    }
}

fn timed_out(provider_id: &str, budget: Duration) -> ProviderError {
    ProviderError::Timeout(format!(
        "{provider_id}: no answer within {}ms",
        budget.as_millis()
    ))
}
