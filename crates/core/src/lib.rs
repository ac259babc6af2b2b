//! # Strata Core
//!
//! Domain types, traits, and error definitions for the Strata query
//! orchestrator. This crate has **no I/O**: it defines the domain model
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator of the pipeline is a small capability trait
//! defined here:
//! - [`KnowledgeLayer`]: one retrieval source (`fetch`)
//! - [`ProviderAdapter`]: one LLM backend (`call`)
//! - [`TenantResolver`]: inbound identity → [`TenantScope`]
//!
//! Implementations live in their respective crates, and tests swap in stubs.

pub mod error;
pub mod intent;
pub mod knowledge;
pub mod message;
pub mod persona;
pub mod provider;
pub mod query;
pub mod tenant;

// Re-export key types at crate root for ergonomics
pub use error::{AllProvidersFailed, Error, LayerError, ProviderError, Result};
pub use intent::{ClassificationMethod, IntentCategory, IntentResult, PriorityTable};
pub use knowledge::{Chunk, ContextBundle, FetchBudget, KnowledgeLayer, LayerErrorKind, LayerId, LayerResult};
pub use message::{ChatMessage, Role, Turn};
pub use persona::PersonaConfig;
pub use provider::{ProviderAdapter, ProviderFailure, ProviderFailureKind, ProviderResponse};
pub use query::{QueryContext, TraceId};
pub use tenant::{RequestIdentity, TenantResolver, TenantScope};
