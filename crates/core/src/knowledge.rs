//! Knowledge layer trait and retrieval result types.
//!
//! A layer is one distinct knowledge source (industry corpus, shared tenant
//! corpus, client corpus, conversation history). Every layer implements
//! [`KnowledgeLayer`]; the retrieval orchestrator fans out to them and
//! merges their [`LayerResult`]s into a [`ContextBundle`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::LayerError;
use crate::tenant::TenantScope;

/// Identifier of a knowledge layer. Declaration order is the default
/// priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerId {
    /// Industry-common corpus, shared by every tenant.
    #[serde(rename = "L1")]
    Industry,
    /// Tenant-wide corpus shared across the tenant's clients.
    #[serde(rename = "L3")]
    Shared,
    /// Client-specific corpus.
    #[serde(rename = "L4")]
    Client,
    /// Conversation history.
    #[serde(rename = "L5")]
    History,
}

impl LayerId {
    /// Every layer, in declaration order.
    pub const ALL: [LayerId; 4] = [Self::Industry, Self::Shared, Self::Client, Self::History];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Industry => "L1",
            Self::Shared => "L3",
            Self::Client => "L4",
            Self::History => "L5",
        }
    }

    /// Human-readable label used in prompts and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Industry => "Industry knowledge",
            Self::Shared => "Shared reference material",
            Self::Client => "Client information",
            Self::History => "Conversation history",
        }
    }

    /// Name of the environment flag that enables this layer.
    pub fn env_flag(&self) -> String {
        format!("{}_ENABLED", self.as_str())
    }

    /// Trace stage recorded when this layer is fetched.
    pub fn stage(&self) -> String {
        format!("layer:{}", self.as_str())
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L1" => Ok(Self::Industry),
            "L3" => Ok(Self::Shared),
            "L4" => Ok(Self::Client),
            "L5" => Ok(Self::History),
            other => Err(format!("unknown layer id '{other}' (expected L1, L3, L4 or L5)")),
        }
    }
}

/// A retrieved piece of context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text content.
    pub text: String,
    /// Human-readable source label (document name, URL, turn reference).
    pub source: String,
    /// Adapter-specific relevance score, higher is better.
    pub score: f32,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            score,
        }
    }
}

/// Limits handed to an adapter for one fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchBudget {
    /// Per-layer timeout enforced by the orchestrator.
    pub timeout: Duration,
    /// Request-wide deadline, if any.
    pub deadline: Option<Instant>,
    /// Maximum number of chunks the layer should return.
    pub max_chunks: usize,
}

impl FetchBudget {
    /// Time left before the earlier of the layer timeout and the deadline.
    pub fn remaining(&self) -> Duration {
        match self.deadline {
            Some(deadline) => self
                .timeout
                .min(deadline.saturating_duration_since(Instant::now())),
            None => self.timeout,
        }
    }
}

/// The core KnowledgeLayer trait.
///
/// Implementations MUST apply `scope` as a hard filter where the data is
/// read, never as a post-filter over other tenants' rows. A fetch may be
/// cancelled at any await point by dropping its future.
#[async_trait]
pub trait KnowledgeLayer: Send + Sync {
    /// Which layer this adapter serves.
    fn id(&self) -> LayerId;

    /// Retrieve chunks relevant to `query_text`, ordered by descending score.
    async fn fetch(
        &self,
        query_text: &str,
        scope: &TenantScope,
        budget: FetchBudget,
    ) -> std::result::Result<Vec<Chunk>, LayerError>;
}

/// Why a layer contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerErrorKind {
    /// The per-layer timeout elapsed.
    Timeout,
    /// The adapter returned an error.
    Backend,
    /// The request deadline expired while the fetch was in flight.
    DeadlineExceeded,
    /// The layer is enabled but no adapter is registered for it.
    NotRegistered,
}

impl std::fmt::Display for LayerErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Backend => write!(f, "backend"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::NotRegistered => write!(f, "not_registered"),
        }
    }
}

/// Outcome of one layer fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    pub layer_id: LayerId,
    pub chunks: Vec<Chunk>,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<LayerErrorKind>,
    pub elapsed_ms: u64,
}

impl LayerResult {
    pub fn success(layer_id: LayerId, chunks: Vec<Chunk>, elapsed_ms: u64) -> Self {
        Self {
            layer_id,
            chunks,
            succeeded: true,
            error_kind: None,
            elapsed_ms,
        }
    }

    pub fn failure(layer_id: LayerId, kind: LayerErrorKind, elapsed_ms: u64) -> Self {
        Self {
            layer_id,
            chunks: Vec::new(),
            succeeded: false,
            error_kind: Some(kind),
            elapsed_ms,
        }
    }

    /// Total characters across all chunks.
    pub fn chars(&self) -> usize {
        self.chunks.iter().map(|c| c.text.chars().count()).sum()
    }
}

/// Merged retrieval output, kept in assembly (priority) order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    layers: Vec<LayerResult>,
    /// Layers that contributed at least one chunk.
    pub layers_accessed: BTreeSet<LayerId>,
    /// Chunks dropped by the context budget.
    pub truncated_chunks: usize,
}

impl ContextBundle {
    /// Build a bundle from results already in priority order.
    pub fn new(layers: Vec<LayerResult>, truncated_chunks: usize) -> Self {
        let layers_accessed = layers
            .iter()
            .filter(|r| !r.chunks.is_empty())
            .map(|r| r.layer_id)
            .collect();
        Self {
            layers,
            layers_accessed,
            truncated_chunks,
        }
    }

    /// Result for one layer, if it was enabled.
    pub fn get(&self, layer_id: LayerId) -> Option<&LayerResult> {
        self.layers.iter().find(|r| r.layer_id == layer_id)
    }

    /// Layer ids present as keys, in priority order.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|r| r.layer_id).collect()
    }

    /// Results in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &LayerResult> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Whether `layer_id` contributed at least one chunk.
    pub fn has_context(&self, layer_id: LayerId) -> bool {
        self.layers_accessed.contains(&layer_id)
    }

    pub fn total_chunks(&self) -> usize {
        self.layers.iter().map(|r| r.chunks.len()).sum()
    }
}
