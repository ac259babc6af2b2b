//! Reference knowledge layers for Strata.
//!
//! - [`InMemoryLayer`]: tenant-partitioned keyword search over documents,
//!   optionally loaded from a JSONL corpus (L1, L3, L4)
//! - [`ConversationHistoryLayer`]: recent turns from a per-tenant,
//!   per-client [`ConversationStore`] (L5)
//! - [`LayerRegistry`]: layer id → adapter, built from configuration

pub mod corpus;
pub mod history;
pub mod in_memory;
pub mod registry;

pub use corpus::{Document, Partition, load_jsonl};
pub use history::{ConversationHistoryLayer, ConversationStore};
pub use in_memory::InMemoryLayer;
pub use registry::{LayerRegistry, build_from_config};

use std::path::PathBuf;
use strata_core::LayerId;

/// Errors raised while loading or populating a knowledge layer.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Failed to read corpus at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Layer {layer} only accepts {expected} documents")]
    WrongPartition { layer: LayerId, expected: &'static str },
}

impl From<CorpusError> for strata_core::Error {
    fn from(e: CorpusError) -> Self {
        strata_core::Error::config(e.to_string())
    }
}
