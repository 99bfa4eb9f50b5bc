//! Tier provider trait
//!
//! All generative backends (local engines, OpenAI-compatible services,
//! HuggingFace, Bedrock) implement this trait; the orchestrator only ever
//! talks to trait objects.

use super::types::{GenerationRequest, Tier, TierResult};
use async_trait::async_trait;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider name used in logs and the failure ledger.
    fn name(&self) -> &str;

    /// The tier this provider answers for.
    fn tier(&self) -> Tier;

    /// Generate a reply for `request`.
    ///
    /// Never panics past this boundary; every failure comes back as a
    /// classified [`TierError`](super::types::TierError). Each call is
    /// bounded by the adapter's own timeout.
    async fn generate(&self, request: GenerationRequest) -> TierResult<String>;

    /// Cheap availability probe. Defaults to available.
    async fn health_check(&self) -> bool {
        true
    }
}
