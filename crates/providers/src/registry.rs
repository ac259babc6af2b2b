//! Provider registry: owns the configured adapters by id.
//!
//! Handles adapter construction from configuration and lookup by the ids
//! that appear in priority lists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strata_config::{AppConfig, ProviderKind};
use strata_core::ProviderAdapter;
use tracing::{debug, info};

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Default per-call timeout for adapters registered without one.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

/// An adapter plus the per-call timeout it was configured with.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub adapter: Arc<dyn ProviderAdapter>,
    pub timeout: Duration,
}

/// Id → adapter map consulted by the dispatcher and the classifier.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id. Replaces any previous entry.
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>, timeout: Duration) {
        let id = adapter.id().to_string();
        self.providers
            .insert(id, RegisteredProvider { adapter, timeout });
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>, timeout: Duration) -> Self {
        self.register(adapter, timeout);
        self
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredProvider> {
        self.providers.get(id)
    }

    /// The adapter alone, for single-shot callers.
    pub fn adapter(&self, id: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers.get(id).map(|p| p.adapter.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}

/// Build adapters from `[providers.*]`.
///
/// A provider is registered only when it has an API key or an explicit
/// endpoint; anything else is left out so the dispatcher reports it as
/// `not_registered`.
pub fn build_from_config(config: &AppConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    for (id, provider_config) in &config.providers {
        if provider_config.api_key.is_none() && provider_config.api_url.is_none() {
            debug!(provider = %id, "No API key or endpoint configured, skipping");
            continue;
        }
        let api_key = provider_config.api_key.clone().unwrap_or_default();

        let adapter: Arc<dyn ProviderAdapter> = match provider_config.kind {
            ProviderKind::Anthropic => {
                let mut p = AnthropicProvider::new(api_key, &provider_config.model)
                    .with_id(id)
                    .with_sampling(provider_config.max_tokens, provider_config.temperature);
                if let Some(url) = &provider_config.api_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
            ProviderKind::Gemini => {
                let mut p = GeminiProvider::new(api_key, &provider_config.model)
                    .with_id(id)
                    .with_sampling(provider_config.max_tokens, provider_config.temperature);
                if let Some(url) = &provider_config.api_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
            ProviderKind::OpenAi => {
                let base_url = provider_config
                    .api_url
                    .clone()
                    .unwrap_or_else(|| crate::openai_compat::DEFAULT_BASE_URL.into());
                Arc::new(
                    OpenAiCompatProvider::new(id, base_url, api_key, &provider_config.model)
                        .with_sampling(provider_config.max_tokens, provider_config.temperature),
                )
            }
        };

        info!(provider = %id, kind = ?provider_config.kind, model = %provider_config.model, "Registered provider");
        registry.register(adapter, provider_config.timeout());
    }

    registry
}
