//! Core tier types
//!
//! Request/response types shared by every tier adapter, the failure classes
//! the escalation orchestrator consumes, and the one artifact that crosses
//! the system boundary outward.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Response tier, ordered by escalating cost and capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Canned response table
    Static,
    /// Locally hosted small model
    Local,
    /// Hosted large-model API
    External,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Static => "static",
            Tier::Local => "local",
            Tier::External => "external",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single generation request handed to a tier adapter.
///
/// Built once per inbound request by the orchestrator; adapters never mutate
/// it and never hold it past the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System prompt establishing the persona, for backends with a system role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Raw user input
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0 = greedy)
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 256,
            temperature: 0.7,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }
}

/// Failure classes a tier attempt can produce.
///
/// Adapters fold every internal failure — transport errors, malformed
/// responses, engine crashes — into one of these before it crosses their
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TierError {
    /// The adapter is misconfigured (missing key, bad backend, empty prompt)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// The local model could not be initialised
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    /// Generation ran and failed, or produced unusable output
    #[error("Inference failed: {0}")]
    InferenceError(String),
    /// The bounded per-call timeout elapsed
    #[error("Request timeout: {0}")]
    Timeout(String),
    /// Bad or missing credentials (external tier)
    #[error("Authentication failed: {0}")]
    AuthError(String),
    /// Provider-side rate limiting (external tier)
    #[error("Rate limited: {0}")]
    RateLimited(String),
}

impl TierError {
    /// Stable class label used in logs and the aggregated error body.
    pub fn class(&self) -> &'static str {
        match self {
            TierError::ConfigError(_) => "config_error",
            TierError::ModelLoadError(_) => "model_load_error",
            TierError::InferenceError(_) => "inference_error",
            TierError::Timeout(_) => "timeout",
            TierError::AuthError(_) => "auth_error",
            TierError::RateLimited(_) => "rate_limited",
        }
    }
}

/// Result type for tier adapter calls.
pub type TierResult<T> = Result<T, TierError>;

/// One failed attempt in the escalation ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierFailure {
    pub tier: Tier,
    pub error: TierError,
}

/// Every enabled tier failed and the static fallback was not allowed.
///
/// The only error a caller ever sees; it names each attempted tier and why it
/// failed so the exhaustion is diagnosable from the error alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationExhausted {
    pub failures: Vec<TierFailure>,
}

impl EscalationExhausted {
    /// Tiers that were attempted, in attempt order.
    pub fn tiers_attempted(&self) -> Vec<Tier> {
        self.failures.iter().map(|f| f.tier).collect()
    }
}

impl fmt::Display for EscalationExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all response tiers failed")?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.tier, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for EscalationExhausted {}

/// The only artifact that crosses the system boundary outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    /// Generated reply text
    #[serde(rename = "output")]
    pub text: String,
    /// Tier that produced the reply
    pub tier: Tier,
    /// Whether a lower generative tier was attempted and failed first
    pub escalated: bool,
}
