//! Warm model cache
//!
//! Holds at most one loaded engine per process, keyed by configuration
//! identity. Reloading a model per request would dwarf the request itself in
//! a short-lived execution context, so the handle lives until the identity
//! changes or the process is recycled. The slot lock is held across the
//! load: concurrent callers wait on the in-flight load instead of starting
//! a second one.

use crate::backend::{ResolvedBackend, resolve_backend};
use crate::config::LocalLlmConfig;
use crate::engine::{Gpt4AllEngine, LlamaCppEngine, ModelHandle};
use async_trait::async_trait;
use misaki_foundation::llm::types::TierResult;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Configuration identity of a loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelKey {
    pub backend: String,
    pub model_path: String,
}

impl ModelKey {
    pub fn for_config(config: &LocalLlmConfig) -> Self {
        let model_path = Path::new(&config.model_path)
            .canonicalize()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| config.model_path.clone());
        Self {
            backend: config.backend.to_string(),
            model_path,
        }
    }
}

/// Loads an engine for a configuration. A trait so tests can observe and
/// script loads.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, config: &LocalLlmConfig) -> TierResult<ModelHandle>;
}

/// Production loader: resolve the backend, then initialise its engine.
pub struct BackendLoader;

#[async_trait]
impl ModelLoader for BackendLoader {
    async fn load(&self, config: &LocalLlmConfig) -> TierResult<ModelHandle> {
        match resolve_backend(config)? {
            ResolvedBackend::Gpt4All => Ok(Arc::new(Gpt4AllEngine::load(config)?)),
            ResolvedBackend::LlamaCpp => Ok(Arc::new(LlamaCppEngine::load(config)?)),
        }
    }
}

struct CachedModel {
    key: ModelKey,
    handle: ModelHandle,
}

/// The warm cache. Created once per process and injected into the local
/// provider; never a global.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    slot: Mutex<Option<CachedModel>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::with_loader(Arc::new(BackendLoader))
    }

    pub fn with_loader(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
        }
    }

    /// Acquire the warm handle for `config`, loading lazily on first use.
    ///
    /// Idempotent for an unchanged configuration: repeated calls return the
    /// same handle without reloading. A changed backend or model path drops
    /// the old handle (release is infallible) and loads the replacement.
    pub async fn acquire(&self, config: &LocalLlmConfig) -> TierResult<ModelHandle> {
        let mut slot = self.slot.lock().await;
        let key = ModelKey::for_config(config);

        if let Some(cached) = slot.as_ref() {
            if cached.key == key {
                tracing::debug!(model = %key.model_path, "reusing warm model handle");
                return Ok(cached.handle.clone());
            }
            tracing::info!(
                old = %cached.key.model_path,
                new = %key.model_path,
                "model identity changed, replacing handle"
            );
        }

        *slot = None;
        let handle = self.loader.load(config).await?;
        *slot = Some(CachedModel {
            key,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    /// Drop the warm handle, forcing a reload on next acquire.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    /// Whether a handle is currently resident.
    pub async fn is_warm(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}
