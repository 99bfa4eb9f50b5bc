//! Test doubles for the escalation chain

use async_trait::async_trait;
use misaki_foundation::llm::provider::LLMProvider;
use misaki_foundation::llm::types::{GenerationRequest, Tier, TierError, TierResult};
use misaki_local_llm::backend::ResolvedBackend;
use misaki_local_llm::cache::ModelLoader;
use misaki_local_llm::config::LocalLlmConfig;
use misaki_local_llm::engine::{EngineMetadata, InferenceEngine, ModelHandle};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Provider that pops scripted outcomes in order, then repeats a default.
/// Records every prompt it was handed.
pub struct ScriptedProvider {
    tier: Tier,
    default: TierResult<String>,
    queue: Mutex<VecDeque<TierResult<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Provider that always succeeds with `text`.
    pub fn succeeding(tier: Tier, text: &str) -> Self {
        Self {
            tier,
            default: Ok(text.to_string()),
            queue: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Provider that always fails with `error`.
    pub fn failing(tier: Tier, error: TierError) -> Self {
        Self {
            tier,
            default: Err(error),
            queue: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue an outcome served before the default kicks in.
    pub fn then(self, outcome: TierResult<String>) -> Self {
        self.queue.lock().expect("queue lock").push_back(outcome);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    async fn generate(&self, request: GenerationRequest) -> TierResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("prompts lock").push(request.prompt.clone());
        let queued = self.queue.lock().expect("queue lock").pop_front();
        match queued {
            Some(outcome) => outcome,
            None => self.default.clone(),
        }
    }
}

/// Engine with a fixed reply, standing in for a loaded model.
pub struct StubEngine {
    metadata: EngineMetadata,
    reply: String,
}

impl StubEngine {
    pub fn new(model_path: &str, reply: &str) -> Self {
        Self {
            metadata: EngineMetadata {
                model_name: "stub".into(),
                model_path: model_path.into(),
                size_bytes: 1,
                num_threads: None,
            },
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl InferenceEngine for StubEngine {
    fn backend(&self) -> ResolvedBackend {
        ResolvedBackend::Gpt4All
    }

    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    async fn complete(&self, _request: &GenerationRequest) -> TierResult<String> {
        Ok(self.reply.clone())
    }
}

/// Loader with an observable load counter, serving [`StubEngine`]s.
pub struct CountingLoader {
    reply: String,
    loads: AtomicUsize,
}

impl CountingLoader {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            loads: AtomicUsize::new(0),
        })
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoader for CountingLoader {
    async fn load(&self, config: &LocalLlmConfig) -> TierResult<ModelHandle> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubEngine::new(&config.model_path, &self.reply)))
    }
}
