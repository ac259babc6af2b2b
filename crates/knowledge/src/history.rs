//! Conversation history layer (L5).
//!
//! Turns are stored per partition key (`tenant_id` or
//! `tenant_id#client_id`), so a fetch can only ever see the conversation of
//! the scope it was called with.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::{Chunk, FetchBudget, KnowledgeLayer, LayerError, LayerId, Role, TenantScope, Turn};
use tokio::sync::RwLock;

/// Upper bound on turns retained per partition.
const MAX_TURNS_PER_PARTITION: usize = 200;

/// Per-tenant, per-client turn store.
#[derive(Debug, Default)]
pub struct ConversationStore {
    turns: RwLock<HashMap<String, Vec<Turn>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to the scope's conversation.
    pub async fn append(&self, scope: &TenantScope, turn: Turn) {
        let mut turns = self.turns.write().await;
        let conversation = turns.entry(scope.partition_key()).or_default();
        conversation.push(turn);
        if conversation.len() > MAX_TURNS_PER_PARTITION {
            let excess = conversation.len() - MAX_TURNS_PER_PARTITION;
            conversation.drain(..excess);
        }
    }

    pub async fn extend(&self, scope: &TenantScope, turns: impl IntoIterator<Item = Turn>) {
        for turn in turns {
            self.append(scope, turn).await;
        }
    }

    /// The last `k` turns, oldest first.
    pub async fn recent(&self, scope: &TenantScope, k: usize) -> Vec<Turn> {
        let turns = self.turns.read().await;
        turns
            .get(&scope.partition_key())
            .map(|conversation| {
                let start = conversation.len().saturating_sub(k);
                conversation[start..].to_vec()
            })
            .unwrap_or_default()
    }
}

/// Serves the last K turns of the caller's conversation as chunks.
pub struct ConversationHistoryLayer {
    store: Arc<ConversationStore>,
    k_recent: usize,
}

impl ConversationHistoryLayer {
    pub fn new(store: Arc<ConversationStore>, k_recent: usize) -> Self {
        Self { store, k_recent }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }
}

#[async_trait]
impl KnowledgeLayer for ConversationHistoryLayer {
    fn id(&self) -> LayerId {
        LayerId::History
    }

    async fn fetch(
        &self,
        _query_text: &str,
        scope: &TenantScope,
        budget: FetchBudget,
    ) -> Result<Vec<Chunk>, LayerError> {
        let k = self.k_recent.min(budget.max_chunks);
        let turns = self.store.recent(scope, k).await;
        let total = turns.len();

        Ok(turns
            .into_iter()
            .enumerate()
            .map(|(i, turn)| {
                let speaker = match turn.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    Role::System => "System",
                };
                // Newer turns score higher; chunks stay in chronological order.
                let score = (i + 1) as f32 / total as f32;
                Chunk::new(
                    format!("{speaker}: {}", turn.content),
                    format!("turn:{}", i + 1),
                    score,
                )
            })
            .collect())
    }
}
