//! In-memory knowledge layer: keyword search over a partitioned corpus.
//!
//! The tenant filter is applied while scanning, before any scoring, so a
//! document outside the caller's scope is never even ranked.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use strata_core::{Chunk, FetchBudget, KnowledgeLayer, LayerError, LayerId, TenantScope};
use tokio::sync::RwLock;
use tracing::debug;

use crate::CorpusError;
use crate::corpus::{self, Document, Partition};

/// A knowledge layer that keeps its documents in a Vec.
pub struct InMemoryLayer {
    id: LayerId,
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryLayer {
    pub fn new(id: LayerId) -> Self {
        Self {
            id,
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Build a layer from a JSONL corpus file.
    pub fn from_jsonl(id: LayerId, path: &Path) -> Result<Self, CorpusError> {
        let documents = corpus::load_jsonl(path)?;
        for doc in &documents {
            check_partition(id, &doc.partition)?;
        }
        Ok(Self {
            id,
            documents: Arc::new(RwLock::new(documents)),
        })
    }

    /// Add one document. Its partition must match the layer.
    pub async fn insert(&self, document: Document) -> Result<(), CorpusError> {
        check_partition(self.id, &document.partition)?;
        self.documents.write().await.push(document);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn check_partition(layer: LayerId, partition: &Partition) -> Result<(), CorpusError> {
    let expected = Partition::expected_for(layer);
    if partition.kind() == expected {
        Ok(())
    } else {
        Err(CorpusError::WrongPartition { layer, expected })
    }
}

/// Lower-cased search terms. ASCII words of two or more characters are
/// kept whole; other scripts are split into character bigrams.
fn terms(query: &str) -> Vec<String> {
    let mut out = Vec::new();
    for token in query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if token.is_ascii() {
            if token.len() >= 2 {
                out.push(token);
            }
        } else {
            let chars: Vec<char> = token.chars().collect();
            if chars.len() == 1 {
                out.push(token);
            } else {
                out.extend(chars.windows(2).map(|w| w.iter().collect::<String>()));
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Matched-term count, lightly normalised by document length.
fn score(text: &str, terms: &[String]) -> f32 {
    let lower = text.to_lowercase();
    let hits: usize = terms.iter().map(|t| lower.matches(t.as_str()).count()).sum();
    if hits == 0 {
        return 0.0;
    }
    hits as f32 / (lower.chars().count() as f32 / 100.0).max(1.0)
}

#[async_trait]
impl KnowledgeLayer for InMemoryLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    async fn fetch(
        &self,
        query_text: &str,
        scope: &TenantScope,
        budget: FetchBudget,
    ) -> Result<Vec<Chunk>, LayerError> {
        if self.id == LayerId::Client && !scope.has_client() {
            debug!(layer = %self.id, tenant_id = scope.tenant_id(), "No client in scope, nothing to fetch");
            return Ok(Vec::new());
        }

        let terms = terms(query_text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut chunks: Vec<Chunk> = documents
            .iter()
            .filter(|doc| doc.partition.visible_to(scope))
            .filter_map(|doc| {
                let s = score(&doc.text, &terms);
                (s > 0.0).then(|| Chunk::new(doc.text.clone(), doc.source.clone(), s))
            })
            .collect();

        chunks.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        chunks.truncate(budget.max_chunks);

        debug!(layer = %self.id, tenant_id = scope.tenant_id(), hits = chunks.len(), "Layer fetch complete");
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn budget(max_chunks: usize) -> FetchBudget {
        FetchBudget {
            timeout: Duration::from_secs(3),
            deadline: None,
            max_chunks,
        }
    }

    async fn client_layer() -> InMemoryLayer {
        let layer = InMemoryLayer::new(LayerId::Client);
        for doc in [
            Document::client("acme", "widgets", "Widgets leave policy: 20 days", "widgets/handbook"),
            Document::client("acme", "gadgets", "Gadgets leave policy: 25 days", "gadgets/handbook"),
            Document::client("globex", "widgets", "Globex leave policy: 30 days", "globex/handbook"),
        ] {
            layer.insert(doc).await.unwrap();
        }
        layer
    }

    #[tokio::test]
    async fn client_layer_never_crosses_partitions() {
        let layer = client_layer().await;
        let chunks = layer
            .fetch("leave policy", &TenantScope::client("acme", "widgets"), budget(8))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "widgets/handbook");
    }

    #[tokio::test]
    async fn client_layer_without_client_returns_nothing() {
        let layer = client_layer().await;
        let chunks = layer
            .fetch("leave policy", &TenantScope::tenant("acme"), budget(8))
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn shared_layer_filters_by_tenant() {
        let layer = InMemoryLayer::new(LayerId::Shared);
        layer
            .insert(Document::tenant("acme", "Acme expense rules", "acme/expenses"))
            .await
            .unwrap();
        layer
            .insert(Document::tenant("globex", "Globex expense rules", "globex/expenses"))
            .await
            .unwrap();

        let chunks = layer
            .fetch("expense rules", &TenantScope::client("globex", "any"), budget(8))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "globex/expenses");
    }

    #[tokio::test]
    async fn results_ranked_and_capped() {
        let layer = InMemoryLayer::new(LayerId::Industry);
        layer
            .insert(Document::global("Article 15 sets notice. Article 15 applies broadly.", "a"))
            .await
            .unwrap();
        layer
            .insert(Document::global("Article 16 covers something else entirely", "b"))
            .await
            .unwrap();
        layer
            .insert(Document::global("Unrelated text", "c"))
            .await
            .unwrap();

        let chunks = layer
            .fetch("Article 15", &TenantScope::tenant("t"), budget(1))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].source, "a");
    }

    #[tokio::test]
    async fn japanese_queries_match_by_bigram() {
        let layer = InMemoryLayer::new(LayerId::Industry);
        layer
            .insert(Document::global("労働基準法第15条は労働条件の明示を定める", "labor"))
            .await
            .unwrap();
        let chunks = layer
            .fetch("労働条件について", &TenantScope::tenant("t"), budget(8))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn wrong_partition_is_rejected() {
        let layer = InMemoryLayer::new(LayerId::Industry);
        let err = layer
            .insert(Document::tenant("acme", "x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, CorpusError::WrongPartition { .. }));
        assert!(layer.is_empty().await);
    }

    #[tokio::test]
    async fn from_jsonl_checks_every_document() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, r#"{{"text":"Shared doc","source":"s","scope":"tenant","tenant_id":"acme"}}"#).unwrap();
        let layer = InMemoryLayer::from_jsonl(LayerId::Shared, tmp.path()).unwrap();
        assert_eq!(layer.len().await, 1);
        assert!(InMemoryLayer::from_jsonl(LayerId::Industry, tmp.path()).is_err());
    }

    #[test]
    fn term_extraction() {
        assert_eq!(terms("What does Article 15 say?"), vec!["15", "article", "does", "say", "what"]);
        assert_eq!(terms("条文"), vec!["条文"]);
        assert!(terms("? !").is_empty());
    }
}
