//! Local tier provider
//!
//! Plugs the local engines into the escalation chain: borrows a warm handle
//! from the model cache per call and bounds each completion with the
//! configured timeout. The provider owns no engine state of its own.

use crate::cache::ModelCache;
use crate::config::LocalLlmConfig;
use async_trait::async_trait;
use misaki_foundation::config::ConfigurationError;
use misaki_foundation::llm::provider::LLMProvider;
use misaki_foundation::llm::types::{GenerationRequest, Tier, TierError, TierResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct LocalProvider {
    config: LocalLlmConfig,
    cache: Arc<ModelCache>,
}

impl LocalProvider {
    /// Validate the configuration and wire the provider to the cache the
    /// process created at startup.
    pub fn new(
        config: LocalLlmConfig,
        cache: Arc<ModelCache>,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config, cache })
    }

    pub fn config(&self) -> &LocalLlmConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn tier(&self) -> Tier {
        Tier::Local
    }

    async fn generate(&self, request: GenerationRequest) -> TierResult<String> {
        let engine = self.cache.acquire(&self.config).await?;

        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, engine.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(TierError::Timeout(format!(
                "local inference exceeded {}s",
                self.config.timeout_secs
            ))),
        }
    }

    async fn health_check(&self) -> bool {
        Path::new(&self.config.model_path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ResolvedBackend;
    use crate::cache::ModelLoader;
    use crate::engine::{EngineMetadata, InferenceEngine, ModelHandle};

    struct SlowEngine {
        metadata: EngineMetadata,
        delay: Duration,
    }

    #[async_trait]
    impl InferenceEngine for SlowEngine {
        fn backend(&self) -> ResolvedBackend {
            ResolvedBackend::LlamaCpp
        }

        fn metadata(&self) -> &EngineMetadata {
            &self.metadata
        }

        async fn complete(&self, _request: &GenerationRequest) -> TierResult<String> {
            tokio::time::sleep(self.delay).await;
            Ok("遅い答え".into())
        }
    }

    struct SlowLoader {
        delay: Duration,
    }

    #[async_trait]
    impl ModelLoader for SlowLoader {
        async fn load(&self, config: &LocalLlmConfig) -> TierResult<ModelHandle> {
            Ok(Arc::new(SlowEngine {
                metadata: EngineMetadata {
                    model_name: "slow".into(),
                    model_path: config.model_path.clone(),
                    size_bytes: 1,
                    num_threads: None,
                },
                delay: self.delay,
            }))
        }
    }

    fn provider_with_delay(delay: Duration, timeout_secs: u64) -> LocalProvider {
        let cache = Arc::new(ModelCache::with_loader(Arc::new(SlowLoader { delay })));
        let config = LocalLlmConfig::new("/models/misaki-7b.gguf").with_timeout(timeout_secs);
        LocalProvider::new(config, cache).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let cache = Arc::new(ModelCache::new());
        let result = LocalProvider::new(LocalLlmConfig::default(), cache);
        assert!(matches!(result, Err(ConfigurationError::Missing(_))));
    }

    #[tokio::test]
    async fn test_generate_within_deadline_succeeds() {
        let provider = provider_with_delay(Duration::from_millis(10), 5);
        let reply = provider
            .generate(GenerationRequest::new("こんばんは"))
            .await
            .unwrap();
        assert_eq!(reply, "遅い答え");
    }

    #[tokio::test]
    async fn test_generate_past_deadline_is_timeout() {
        let provider = provider_with_delay(Duration::from_millis(1500), 1);
        let err = provider
            .generate(GenerationRequest::new("こんばんは"))
            .await
            .unwrap_err();
        assert!(matches!(err, TierError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_as_model_load_error() {
        let cache = Arc::new(ModelCache::new());
        let config = LocalLlmConfig::new("/nonexistent/misaki.gguf");
        let provider = LocalProvider::new(config, cache).unwrap();

        let err = provider
            .generate(GenerationRequest::new("こんばんは"))
            .await
            .unwrap_err();
        assert!(matches!(err, TierError::ModelLoadError(_)));
    }

    #[tokio::test]
    async fn test_health_check_reflects_model_presence() {
        let provider = provider_with_delay(Duration::from_millis(1), 5);
        assert!(!provider.health_check().await);
    }
}
