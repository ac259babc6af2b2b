//! The Strata query pipeline.
//!
//! One request flows through four stages, each recorded in the trace:
//!
//! 1. **Classify** the query into an intent category and layer priority
//! 2. **Retrieve** from every enabled knowledge layer concurrently
//! 3. **Assemble** the persona, context and conversation into a prompt
//! 4. **Generate** an answer by walking the provider priority list
//!
//! [`Pipeline`] wires the stages together; each stage is usable on its own.

pub mod intent;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod tenant;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use intent::{ClassificationError, IntentClassifier, KeywordMatcher};
pub use pipeline::{Pipeline, PipelineResponse};
pub use prompt::{PromptAssembler, PromptInput};
pub use retrieval::{LayerSettings, RetrievalOrchestrator};
pub use tenant::DirectoryResolver;
