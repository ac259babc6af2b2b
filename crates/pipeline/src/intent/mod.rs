//! Intent classification.
//!
//! Two stages: a keyword fast path ([`KeywordMatcher`]) and, only when it
//! finds nothing, a single model call. Classification never fails; anything
//! that goes wrong downgrades to UNKNOWN with the default layer ordering.

mod model;
pub mod patterns;

use std::sync::Arc;
use std::time::Duration;
use strata_config::AppConfig;
use strata_core::{
    ClassificationMethod, IntentCategory, IntentResult, PriorityTable, ProviderAdapter,
    ProviderError, Turn,
};
use strata_providers::ProviderRegistry;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use model::ModelClassifier;
pub use patterns::{KeywordMatch, KeywordMatcher};

/// Confidence assigned to a model-decided category.
const MODEL_CONFIDENCE: f32 = 0.6;

/// Classifier failures. Construction errors surface as configuration errors;
/// everything else is downgraded to UNKNOWN inside [`IntentClassifier::classify`].
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Invalid {category} pattern '{pattern}': {reason}")]
    InvalidPattern {
        category: String,
        pattern: String,
        reason: String,
    },

    #[error("Invalid classifier configuration: {0}")]
    Config(String),

    #[error("No classifier provider available")]
    NoModel,

    #[error("Classifier provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Classifier call timed out")]
    Timeout,

    #[error("Unrecognised classifier reply: {0:?}")]
    UnrecognisedLabel(String),
}

impl From<ClassificationError> for strata_core::Error {
    fn from(e: ClassificationError) -> Self {
        strata_core::Error::config(e.to_string())
    }
}

/// Decides the intent category and the layer priority that follows from it.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    matcher: KeywordMatcher,
    priority: PriorityTable,
    model: Option<ModelClassifier>,
}

impl IntentClassifier {
    /// A keyword-only classifier.
    pub fn new(matcher: KeywordMatcher, priority: PriorityTable) -> Self {
        Self {
            matcher,
            priority,
            model: None,
        }
    }

    /// Enable Stage 2 with `adapter`, bounded by `timeout` per call.
    pub fn with_model(mut self, adapter: Arc<dyn ProviderAdapter>, timeout: Duration) -> Self {
        self.model = Some(ModelClassifier::new(adapter, timeout));
        self
    }

    /// Build from configuration. The Stage 2 provider is looked up in
    /// `providers`; if it is not registered the classifier runs keyword-only.
    pub fn from_config(
        config: &AppConfig,
        providers: &ProviderRegistry,
    ) -> Result<Self, ClassificationError> {
        let order = config
            .group_order()
            .map_err(|e| ClassificationError::Config(e.to_string()))?;
        let priority = config
            .priority_table()
            .map_err(|e| ClassificationError::Config(e.to_string()))?;
        let matcher = KeywordMatcher::from_config(&config.classifier, &order)?;

        let mut classifier = Self::new(matcher, priority);
        match config.classifier_provider() {
            Some(id) => match providers.adapter(id) {
                Some(adapter) => {
                    let timeout = Duration::from_millis(config.classifier.timeout_ms);
                    classifier = classifier.with_model(adapter, timeout);
                }
                None => warn!(provider = id, "Classifier provider not registered; keyword-only"),
            },
            None => debug!("No classifier provider configured; keyword-only"),
        }
        Ok(classifier)
    }

    pub fn priority_table(&self) -> &PriorityTable {
        &self.priority
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Classify `query_text`. Stage 2 is bounded by its own timeout and by
    /// `deadline`, when given.
    pub async fn classify(
        &self,
        query_text: &str,
        recent_turns: &[Turn],
        deadline: Option<Instant>,
    ) -> IntentResult {
        if let Some(found) = self.matcher.find(query_text, !recent_turns.is_empty()) {
            debug!(category = %found.category, pattern = %found.pattern, "Keyword match");
            return IntentResult {
                category: found.category,
                layer_priority: self.priority.priority_for(found.category).to_vec(),
                confidence: 1.0,
                method: ClassificationMethod::Keyword,
                matched_pattern: Some(found.pattern),
            };
        }

        match self.classify_with_model(query_text, recent_turns, deadline).await {
            Ok(category) => {
                info!(category = %category, "Model classification");
                IntentResult {
                    category,
                    layer_priority: self.priority.priority_for(category).to_vec(),
                    confidence: MODEL_CONFIDENCE,
                    method: ClassificationMethod::Model,
                    matched_pattern: None,
                }
            }
            Err(ClassificationError::NoModel) => {
                debug!("No keyword match and no model; UNKNOWN");
                self.unknown()
            }
            Err(e) => {
                warn!(error = %e, "Model classification failed; UNKNOWN");
                self.unknown()
            }
        }
    }

    async fn classify_with_model(
        &self,
        query_text: &str,
        recent_turns: &[Turn],
        deadline: Option<Instant>,
    ) -> Result<IntentCategory, ClassificationError> {
        let model = self.model.as_ref().ok_or(ClassificationError::NoModel)?;
        debug!(provider = model.provider_id(), "Falling back to model classification");
        model.classify(query_text, recent_turns, deadline).await
    }

    fn unknown(&self) -> IntentResult {
        IntentResult::unknown(&self.priority)
    }
}
