//! Language-model integration
//!
//! [`LLMProvider`] is the uniform generate capability every backend — local
//! engines and hosted APIs alike — implements. Adapters classify each
//! internal failure into a [`TierError`] so the orchestrator can escalate
//! without ever inspecting a transport.

pub mod huggingface;
pub mod openai;
pub mod provider;
pub mod types;

#[cfg(feature = "bedrock")]
pub mod bedrock;

pub use provider::LLMProvider;
pub use types::{GenerationRequest, Tier, TierError, TierResult};
