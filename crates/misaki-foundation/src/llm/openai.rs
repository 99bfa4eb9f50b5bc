//! OpenAI-compatible chat adapter
//!
//! Targets api.openai.com or any service speaking the chat-completions
//! dialect (vLLM, LocalAI, gateways). The endpoint can be redirected with
//! `LLM_API_ENDPOINT`; credentials come from `OPENAI_API_KEY`.

use super::provider::LLMProvider;
use super::types::{GenerationRequest, Tier, TierError, TierResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI adapter configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key
    pub api_key: String,
    /// Base URL, e.g. https://api.openai.com/v1
    pub base_url: String,
    /// Model id
    pub model: String,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 10,
        }
    }
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build from environment variables (`OPENAI_API_KEY`, `OPENAI_MODEL`,
    /// `LLM_API_ENDPOINT`).
    pub fn from_env() -> Self {
        let mut cfg = Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ..Default::default()
        };

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            cfg.model = model;
        }
        if let Ok(endpoint) = std::env::var("LLM_API_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                cfg.base_url = endpoint;
            }
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

/// OpenAI-compatible chat provider
pub struct OpenAIProvider {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    pub fn from_env() -> Self {
        Self::with_config(OpenAIConfig::from_env())
    }

    pub fn with_config(config: OpenAIConfig) -> Self {
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
}

/// Classify a non-success HTTP response into the tier failure taxonomy.
pub(crate) fn classify_http_failure(status: reqwest::StatusCode, body: &str) -> TierError {
    let detail = format!("HTTP {}: {}", status.as_u16(), body.trim());
    match status.as_u16() {
        401 | 403 => TierError::AuthError(detail),
        429 => TierError::RateLimited(detail),
        _ => TierError::InferenceError(detail),
    }
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn tier(&self) -> Tier {
        Tier::External
    }

    async fn generate(&self, request: GenerationRequest) -> TierResult<String> {
        if self.config.api_key.is_empty() {
            return Err(TierError::ConfigError("OPENAI_API_KEY is not set".into()));
        }

        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({"role": "system", "content": system}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        tracing::debug!(model = %self.config.model, url = %url, "sending chat completion");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(Self::map_error)?;

        if !status.is_success() {
            return Err(classify_http_failure(status, &text));
        }

        let parsed: ChatCompletion = serde_json::from_str(&text)
            .map_err(|e| TierError::InferenceError(format!("unexpected response shape: {e}")))?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default()
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
