//! Escalation orchestrator
//!
//! Drives one request through the fixed tier order
//! **static → local → external** as an explicit state sequence. Lower-tier
//! failures are absorbed into a failure ledger and escalate; only exhaustion
//! of every tier is visible to the caller, and even that degrades to the
//! static fallback reply when the deployment allows it.
//!
//! Escalation is strictly one-directional within a request: a tier is never
//! retried once passed, and the order never depends on input content — the
//! only input-dependent branch is whether a static rule matches.

use crate::llm::provider::LLMProvider;
use crate::llm::types::{
    EscalationExhausted, FinalResponse, GenerationRequest, Tier, TierError, TierFailure,
};
use crate::persona;
use crate::statics::StaticResponder;
use std::sync::Arc;

/// Per-request escalation states. Entry is the static attempt; every `Ok`
/// return is the DONE state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StaticAttempt,
    LocalAttempt,
    ExternalAttempt,
    Fallback,
}

/// The escalation core.
///
/// Owns no model state: providers are injected as shared handles at
/// construction and borrowed per call, never held beyond a single request.
pub struct EscalationOrchestrator {
    statics: StaticResponder,
    local: Option<Arc<dyn LLMProvider>>,
    external: Option<Arc<dyn LLMProvider>>,
    allow_static_fallback: bool,
    system_prompt: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl EscalationOrchestrator {
    pub fn builder() -> EscalationOrchestratorBuilder {
        EscalationOrchestratorBuilder::new()
    }

    fn request_for(&self, input: &str) -> GenerationRequest {
        GenerationRequest {
            system: self.system_prompt.clone(),
            prompt: input.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Answer one request. Emits exactly one [`FinalResponse`] or one
    /// aggregated [`EscalationExhausted`] — never both, never neither.
    pub async fn respond(&self, input: &str) -> Result<FinalResponse, EscalationExhausted> {
        let mut failures: Vec<TierFailure> = Vec::new();
        let mut state = State::StaticAttempt;

        loop {
            match state {
                State::StaticAttempt => {
                    if let Some(reply) = self.statics.lookup(input) {
                        tracing::debug!(tier = %Tier::Static, "static rule matched");
                        return Ok(FinalResponse {
                            text: reply.to_string(),
                            tier: Tier::Static,
                            escalated: false,
                        });
                    }
                    state = if self.local.is_some() {
                        State::LocalAttempt
                    } else {
                        State::ExternalAttempt
                    };
                }
                State::LocalAttempt => {
                    if let Some(local) = &self.local {
                        match local.generate(self.request_for(input)).await {
                            Ok(text) => {
                                tracing::debug!(provider = local.name(), "local tier answered");
                                return Ok(FinalResponse {
                                    text,
                                    tier: Tier::Local,
                                    escalated: false,
                                });
                            }
                            Err(error) => {
                                tracing::warn!(
                                    provider = local.name(),
                                    class = error.class(),
                                    %error,
                                    "local tier failed, escalating"
                                );
                                failures.push(TierFailure {
                                    tier: Tier::Local,
                                    error,
                                });
                            }
                        }
                    }
                    state = State::ExternalAttempt;
                }
                State::ExternalAttempt => {
                    match &self.external {
                        Some(external) => match external.generate(self.request_for(input)).await {
                            Ok(text) => {
                                let escalated = failures.iter().any(|f| f.tier == Tier::Local);
                                tracing::debug!(
                                    provider = external.name(),
                                    escalated,
                                    "external tier answered"
                                );
                                return Ok(FinalResponse {
                                    text,
                                    tier: Tier::External,
                                    escalated,
                                });
                            }
                            Err(error) => {
                                tracing::warn!(
                                    provider = external.name(),
                                    class = error.class(),
                                    %error,
                                    "external tier failed"
                                );
                                failures.push(TierFailure {
                                    tier: Tier::External,
                                    error,
                                });
                            }
                        },
                        None => failures.push(TierFailure {
                            tier: Tier::External,
                            error: TierError::ConfigError(
                                "no external provider configured".into(),
                            ),
                        }),
                    }
                    state = State::Fallback;
                }
                State::Fallback => {
                    if self.allow_static_fallback {
                        tracing::warn!(
                            attempts = failures.len(),
                            "all generative tiers failed, serving static fallback"
                        );
                        return Ok(FinalResponse {
                            text: self.statics.fallback_reply().to_string(),
                            tier: Tier::Static,
                            escalated: true,
                        });
                    }
                    return Err(EscalationExhausted { failures });
                }
            }
        }
    }
}

/// Builder for [`EscalationOrchestrator`].
pub struct EscalationOrchestratorBuilder {
    statics: StaticResponder,
    local: Option<Arc<dyn LLMProvider>>,
    external: Option<Arc<dyn LLMProvider>>,
    allow_static_fallback: bool,
    system_prompt: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl EscalationOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            statics: StaticResponder::standard(),
            local: None,
            external: None,
            allow_static_fallback: false,
            system_prompt: Some(persona::SYSTEM_PROMPT.to_string()),
            max_tokens: 256,
            temperature: 0.7,
        }
    }

    pub fn statics(mut self, statics: StaticResponder) -> Self {
        self.statics = statics;
        self
    }

    /// Wire the local tier. Leaving it unset skips LOCAL_ATTEMPT entirely.
    pub fn local(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.local = Some(provider);
        self
    }

    pub fn external(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.external = Some(provider);
        self
    }

    pub fn allow_static_fallback(mut self, allow: bool) -> Self {
        self.allow_static_fallback = allow;
        self
    }

    /// Override the persona system prompt; `None` sends requests bare.
    pub fn system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn build(self) -> EscalationOrchestrator {
        EscalationOrchestrator {
            statics: self.statics,
            local: self.local,
            external: self.external,
            allow_static_fallback: self.allow_static_fallback,
            system_prompt: self.system_prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

impl Default for EscalationOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
