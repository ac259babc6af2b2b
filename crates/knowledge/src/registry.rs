//! Layer registry: layer id → adapter.

use std::collections::HashMap;
use std::sync::Arc;
use strata_config::AppConfig;
use strata_core::{KnowledgeLayer, LayerId};
use tracing::{debug, info};

use crate::CorpusError;
use crate::history::{ConversationHistoryLayer, ConversationStore};
use crate::in_memory::InMemoryLayer;

/// The adapters available to the retrieval orchestrator.
#[derive(Clone, Default)]
pub struct LayerRegistry {
    layers: HashMap<LayerId, Arc<dyn KnowledgeLayer>>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own layer id. Replaces any previous one.
    pub fn register(&mut self, layer: Arc<dyn KnowledgeLayer>) {
        self.layers.insert(layer.id(), layer);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, layer: Arc<dyn KnowledgeLayer>) -> Self {
        self.register(layer);
        self
    }

    pub fn get(&self, id: LayerId) -> Option<&Arc<dyn KnowledgeLayer>> {
        self.layers.get(&id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Registered ids in declaration order.
    pub fn ids(&self) -> Vec<LayerId> {
        LayerId::ALL
            .into_iter()
            .filter(|id| self.layers.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("layers", &self.ids())
            .finish()
    }
}

/// Build the reference layers from configuration.
///
/// L1, L3 and L4 are registered when they are enabled and name a corpus
/// file; L5 is always backed by `history`. A layer left unregistered shows up as
/// `not_registered` when it is enabled.
pub fn build_from_config(
    config: &AppConfig,
    history: Arc<ConversationStore>,
) -> Result<LayerRegistry, CorpusError> {
    let mut registry = LayerRegistry::new();

    for id in [LayerId::Industry, LayerId::Shared, LayerId::Client] {
        let settings = config.layers.get(id);
        if !settings.enabled {
            debug!(layer = %id, "Layer disabled, corpus not loaded");
            continue;
        }
        match &settings.corpus {
            Some(path) => {
                let layer = InMemoryLayer::from_jsonl(id, path)?;
                info!(layer = %id, corpus = %path.display(), "Registered corpus layer");
                registry.register(Arc::new(layer));
            }
            None => debug!(layer = %id, "No corpus configured"),
        }
    }

    registry.register(Arc::new(ConversationHistoryLayer::new(
        history,
        config.recent_turns_limit,
    )));

    Ok(registry)
}
