//! HuggingFace Inference API adapter
//!
//! Text-generation through `api-inference.huggingface.co`. The API has no
//! system role, so the persona prompt is folded into the input text.

use super::openai::classify_http_failure;
use super::provider::LLMProvider;
use super::types::{GenerationRequest, Tier, TierError, TierResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// HuggingFace adapter configuration
#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    /// API token
    pub token: String,
    /// Base URL
    pub base_url: String,
    /// Model repo id, e.g. `elyza/ELYZA-japanese-Llama-2-7b-instruct`
    pub model: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "elyza/ELYZA-japanese-Llama-2-7b-instruct".to_string(),
            timeout_secs: 10,
        }
    }
}

impl HuggingFaceConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Build from environment variables (`HUGGINGFACE_TOKEN`,
    /// `HUGGINGFACE_MODEL`).
    pub fn from_env() -> Self {
        let mut cfg = Self {
            token: std::env::var("HUGGINGFACE_TOKEN").unwrap_or_default(),
            ..Default::default()
        };

        if let Ok(model) = std::env::var("HUGGINGFACE_MODEL") {
            cfg.model = model;
        }

        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HuggingFace Inference API provider
pub struct HuggingFaceProvider {
    client: reqwest::Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(HuggingFaceConfig::new(token))
    }

    pub fn from_env() -> Self {
        Self::with_config(HuggingFaceConfig::from_env())
    }

    pub fn with_config(config: HuggingFaceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, config }
    }

    fn map_error(err: reqwest::Error) -> TierError {
        if err.is_timeout() {
            TierError::Timeout(err.to_string())
        } else {
            TierError::InferenceError(err.to_string())
        }
    }

    fn build_input(request: &GenerationRequest) -> String {
        match &request.system {
            Some(system) => format!("{system}\n\n{}", request.prompt),
            None => request.prompt.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[async_trait]
impl LLMProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn tier(&self) -> Tier {
        Tier::External
    }

    async fn generate(&self, request: GenerationRequest) -> TierResult<String> {
        if self.config.token.is_empty() {
            return Err(TierError::ConfigError(
                "HUGGINGFACE_TOKEN is not set".into(),
            ));
        }

        let body = serde_json::json!({
            "inputs": Self::build_input(&request),
            "parameters": {
                "max_new_tokens": request.max_tokens,
                "temperature": request.temperature,
                "return_full_text": false,
            },
        });

        let url = format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        tracing::debug!(model = %self.config.model, "sending text-generation request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Self::map_error)?;

        if !status.is_success() {
            return Err(classify_http_failure(status, &text));
        }

        let parsed: Vec<GeneratedText> = serde_json::from_str(&text)
            .map_err(|e| TierError::InferenceError(format!("unexpected response shape: {e}")))?;

        let content = parsed
            .first()
            .map(|g| g.generated_text.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(TierError::InferenceError(
                "response contained no text".into(),
            ));
        }

        Ok(content)
    }
}
