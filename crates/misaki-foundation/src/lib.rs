//! # misaki-foundation
//!
//! Core building blocks for the Misaki tiered response backend: tier types,
//! the static response table, hosted-model adapters, and the escalation
//! orchestrator that decides which tier answers a request.
//!
//! Tier order is fixed — **static → local → external** — and escalation is
//! strictly one-directional within a request: a tier that failed is never
//! retried, and a lower-tier failure never reaches the caller while a later
//! tier remains.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use misaki_foundation::{EscalationOrchestrator, StaticResponder};
//! use misaki_foundation::llm::openai::OpenAIProvider;
//! use std::sync::Arc;
//!
//! let orchestrator = EscalationOrchestrator::builder()
//!     .statics(StaticResponder::standard())
//!     .external(Arc::new(OpenAIProvider::from_env()))
//!     .allow_static_fallback(true)
//!     .build();
//!
//! let response = orchestrator.respond("こんばんは").await?;
//! assert_eq!(response.text, "こんばんは！");
//! ```

pub mod config;
pub mod escalation;
pub mod llm;
pub mod persona;
pub mod statics;

pub use config::{ConfigurationError, ExternalProviderKind, Settings};
pub use escalation::EscalationOrchestrator;
pub use llm::provider::LLMProvider;
pub use llm::types::{
    EscalationExhausted, FinalResponse, GenerationRequest, Tier, TierError, TierFailure,
    TierResult,
};
pub use statics::StaticResponder;
