//! Amazon Bedrock adapter (feature `bedrock`)
//!
//! `InvokeModel` against an Anthropic-family model. Credential resolution is
//! owned by the AWS config chain; `BEDROCK_CREDENTIALS` selects the profile.

use super::provider::LLMProvider;
use super::types::{GenerationRequest, Tier, TierError, TierResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::primitives::Blob;
use serde::Deserialize;
use std::time::Duration;

/// Bedrock adapter configuration
#[derive(Debug, Clone)]
pub struct BedrockConfig {
    /// AWS profile name; `None` uses the default credential chain
    pub profile: Option<String>,
    /// Bedrock model id
    pub model_id: String,
    /// Per-operation timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            profile: None,
            model_id: "anthropic.claude-3-haiku-20240307-v1:0".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BedrockConfig {
    /// Build from environment variables (`BEDROCK_CREDENTIALS`,
    /// `BEDROCK_MODEL_ID`).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(profile) = std::env::var("BEDROCK_CREDENTIALS") {
            if !profile.trim().is_empty() {
                cfg.profile = Some(profile);
            }
        }
        if let Ok(model_id) = std::env::var("BEDROCK_MODEL_ID") {
            cfg.model_id = model_id;
        }

        cfg
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Amazon Bedrock provider
pub struct BedrockProvider {
    client: Client,
    config: BedrockConfig,
}

impl BedrockProvider {
    /// Resolve the AWS config chain and build a client.
    pub async fn new(config: BedrockConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(Duration::from_secs(config.timeout_secs))
                .build(),
        );
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        Self {
            client: Client::new(&sdk_config),
            config,
        }
    }

    pub async fn from_env() -> Self {
        Self::new(BedrockConfig::from_env()).await
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[async_trait]
impl LLMProvider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn tier(&self) -> Tier {
        Tier::External
    }

    async fn generate(&self, request: GenerationRequest) -> TierResult<String> {
        let mut body = serde_json::json!({
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(system) = &request.system {
            body["system"] = serde_json::json!(system);
        }

        let payload = serde_json::to_vec(&body)
            .map_err(|e| TierError::InferenceError(format!("request encoding failed: {e}")))?;

        tracing::debug!(model = %self.config.model_id, "invoking Bedrock model");

        let output = self
            .client
            .invoke_model()
            .model_id(&self.config.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(|err| match &err {
                SdkError::TimeoutError(_) => TierError::Timeout(err.to_string()),
                SdkError::ServiceError(ctx) => {
                    let service = ctx.err();
                    if service.is_access_denied_exception() {
                        TierError::AuthError(service.to_string())
                    } else if service.is_throttling_exception()
                        || service.is_service_quota_exceeded_exception()
                    {
                        TierError::RateLimited(service.to_string())
                    } else if service.is_model_timeout_exception() {
                        TierError::Timeout(service.to_string())
                    } else {
                        TierError::InferenceError(service.to_string())
                    }
                }
                _ => TierError::InferenceError(err.to_string()),
            })?;

        let parsed: MessageResponse = serde_json::from_slice(output.body().as_ref())
            .map_err(|e| TierError::InferenceError(format!("unexpected response shape: {e}")))?;

        let content = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(TierError::InferenceError(
                "response contained no text".into(),
            ));
        }

        Ok(content)
    }
}
