//! Shared stubs for pipeline tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use strata_core::{
    ChatMessage, Chunk, FetchBudget, KnowledgeLayer, LayerError, LayerId, ProviderAdapter,
    ProviderError, TenantScope,
};

enum Behavior {
    Chunks(Vec<(String, String)>),
    Fail,
    Hang,
}

/// A knowledge layer with scripted behaviour and a call log.
pub struct StubLayer {
    id: LayerId,
    behavior: Behavior,
    delay: Duration,
    seen: Mutex<Vec<TenantScope>>,
}

impl StubLayer {
    fn build(id: LayerId, behavior: Behavior) -> Self {
        Self {
            id,
            behavior,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Returns one chunk per text, sourced `"<layer>#<n>"`.
    pub fn answering(id: LayerId, texts: &[&str]) -> Self {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), format!("{id}#{i}")))
            .collect();
        Self::build(id, Behavior::Chunks(chunks))
    }

    pub fn failing(id: LayerId) -> Self {
        Self::build(id, Behavior::Fail)
    }

    /// Never returns on its own.
    pub fn hanging(id: LayerId) -> Self {
        Self::build(id, Behavior::Hang)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen_scopes(&self) -> Vec<TenantScope> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeLayer for StubLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    async fn fetch(
        &self,
        _query_text: &str,
        scope: &TenantScope,
        budget: FetchBudget,
    ) -> Result<Vec<Chunk>, LayerError> {
        self.seen.lock().unwrap().push(scope.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            Behavior::Chunks(chunks) => Ok(chunks
                .iter()
                .take(budget.max_chunks)
                .map(|(text, source)| Chunk::new(text.clone(), source.clone(), 1.0))
                .collect()),
            Behavior::Fail => Err(LayerError::Backend("stub backend down".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Vec::new())
            }
        }
    }
}

/// A provider that returns a sequence of scripted outcomes.
///
/// Each call returns the next outcome in the queue.
/// Panics if more calls are made than outcomes provided.
pub struct ScriptedProvider {
    id: String,
    outcomes: Mutex<Vec<Result<String, ProviderError>>>,
    received: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(id: &str, outcomes: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            id: id.into(),
            outcomes: Mutex::new(outcomes),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(id: &str, text: &str) -> Self {
        Self::new(id, vec![Ok(text.into())])
    }

    pub fn failing(id: &str, error: ProviderError) -> Self {
        Self::new(id, vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Messages passed to each call, in call order.
    pub fn received(&self) -> Vec<Vec<ChatMessage>> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(&self, messages: &[ChatMessage], _timeout: Duration) -> Result<String, ProviderError> {
        let mut received = self.received.lock().unwrap();
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            panic!(
                "ScriptedProvider '{}': no more outcomes (call #{})",
                self.id,
                received.len() + 1
            );
        }
        received.push(messages.to_vec());
        outcomes.remove(0)
    }
}
