//! Request handler
//!
//! Built once per warm execution context. The model cache and provider
//! handles are created here and injected into the orchestrator, so
//! consecutive invocations of the same process reuse the warm state while
//! ownership stays explicit. Configuration problems fail construction —
//! never an individual request.

use crate::event::parse_event;
use crate::response::LambdaResponse;
use misaki_foundation::config::{ConfigurationError, ExternalProviderKind, Settings};
use misaki_foundation::escalation::EscalationOrchestrator;
use misaki_foundation::llm::huggingface::{HuggingFaceConfig, HuggingFaceProvider};
use misaki_foundation::llm::openai::{OpenAIConfig, OpenAIProvider};
use misaki_foundation::llm::provider::LLMProvider;
use misaki_foundation::statics::StaticResponder;
use misaki_local_llm::{LocalLlmConfig, LocalProvider, ModelCache};
use serde_json::Value;
use std::sync::Arc;

pub struct Handler {
    orchestrator: EscalationOrchestrator,
}

impl Handler {
    /// Wire the whole chain from the environment.
    pub async fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_settings(Settings::from_env()?).await
    }

    /// Wire the chain from explicit settings. Local tier configuration is
    /// still read from `LOCAL_LLM_*` when the tier is enabled.
    pub async fn from_settings(settings: Settings) -> Result<Self, ConfigurationError> {
        let mut builder = EscalationOrchestrator::builder()
            .statics(StaticResponder::standard())
            .allow_static_fallback(settings.allow_static_fallback);

        if settings.use_local_llm {
            let config = LocalLlmConfig::from_env()?;
            builder = builder
                .max_tokens(config.max_tokens)
                .temperature(config.temperature);

            let cache = Arc::new(ModelCache::new());
            let provider = LocalProvider::new(config, cache)?;
            builder = builder.local(Arc::new(provider));
            tracing::info!("local tier enabled");
        }

        if let Some(kind) = settings.external_provider() {
            let provider = build_external(kind, &settings).await?;
            tracing::info!(provider = %kind, "external tier enabled");
            builder = builder.external(provider);
        } else {
            tracing::warn!("no external credential present, external tier disabled");
        }

        Ok(Self {
            orchestrator: builder.build(),
        })
    }

    /// Embed a pre-built orchestrator (tests, alternative wiring).
    pub fn with_orchestrator(orchestrator: EscalationOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Answer one invocation. Always returns a well-formed envelope.
    pub async fn handle(&self, event: &Value) -> Value {
        let input = match parse_event(event) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(%err, "rejected invocation payload");
                return LambdaResponse::bad_request(&err.to_string()).to_value();
            }
        };

        match self.orchestrator.respond(&input).await {
            Ok(response) => {
                tracing::info!(tier = %response.tier, escalated = response.escalated, "answered");
                LambdaResponse::success(&response).to_value()
            }
            Err(err) => {
                tracing::error!(%err, "escalation exhausted");
                LambdaResponse::exhausted(&err).to_value()
            }
        }
    }
}

async fn build_external(
    kind: ExternalProviderKind,
    settings: &Settings,
) -> Result<Arc<dyn LLMProvider>, ConfigurationError> {
    match kind {
        ExternalProviderKind::OpenAI => {
            let config = OpenAIConfig::from_env().with_timeout(settings.external_timeout_secs);
            Ok(Arc::new(OpenAIProvider::with_config(config)))
        }
        ExternalProviderKind::HuggingFace => {
            let config = HuggingFaceConfig::from_env().with_timeout(settings.external_timeout_secs);
            Ok(Arc::new(HuggingFaceProvider::with_config(config)))
        }
        #[cfg(feature = "bedrock")]
        ExternalProviderKind::Bedrock => {
            use misaki_foundation::llm::bedrock::{BedrockConfig, BedrockProvider};
            let config = BedrockConfig::from_env().with_timeout(settings.external_timeout_secs);
            Ok(Arc::new(BedrockProvider::new(config).await))
        }
        #[cfg(not(feature = "bedrock"))]
        ExternalProviderKind::Bedrock => {
            Err(ConfigurationError::FeatureDisabled("bedrock", "bedrock"))
        }
    }
}
