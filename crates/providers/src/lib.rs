//! LLM provider adapters and the fallback dispatcher for Strata.
//!
//! All adapters implement `strata_core::ProviderAdapter`. The
//! [`ProviderRegistry`] holds them by id and the [`FallbackDispatcher`]
//! walks a priority list over the registry.

pub mod anthropic;
pub mod dispatcher;
pub mod gemini;
mod http;
pub mod openai_compat;
pub mod registry;
#[cfg(test)]
mod test_support;

pub use anthropic::AnthropicProvider;
pub use dispatcher::{FallbackDispatcher, QualityGate};
pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use registry::{ProviderRegistry, RegisteredProvider, build_from_config};
