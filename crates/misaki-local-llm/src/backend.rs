//! Backend resolution
//!
//! An explicit backend choice is honored as-is. `Auto` resolves once per
//! load by sniffing the model artifact: GGUF/GGML magics go to llama.cpp,
//! anything else to GPT4All.

use crate::config::{LocalBackend, LocalLlmConfig};
use misaki_foundation::llm::types::{TierError, TierResult};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A concrete backend after `Auto` resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBackend {
    Gpt4All,
    LlamaCpp,
}

impl ResolvedBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedBackend::Gpt4All => "gpt4all",
            ResolvedBackend::LlamaCpp => "llama.cpp",
        }
    }
}

impl fmt::Display for ResolvedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Magics written by llama.cpp model files.
const LLAMA_MAGICS: [&[u8; 4]; 5] = [b"GGUF", b"ggjt", b"ggla", b"ggmf", b"ggml"];

/// Read the leading magic of the model artifact.
pub(crate) fn sniff_magic(path: &str) -> TierResult<[u8; 4]> {
    let mut file = std::fs::File::open(path).map_err(|e| {
        TierError::ModelLoadError(format!("cannot open model file {path}: {e}"))
    })?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).map_err(|e| {
        TierError::ModelLoadError(format!("cannot read model file {path}: {e}"))
    })?;
    Ok(magic)
}

pub(crate) fn is_llama_magic(magic: &[u8; 4]) -> bool {
    LLAMA_MAGICS.iter().any(|m| *m == magic)
}

/// Resolve the configured backend against the model artifact.
pub fn resolve_backend(config: &LocalLlmConfig) -> TierResult<ResolvedBackend> {
    match config.backend {
        LocalBackend::Gpt4All => Ok(ResolvedBackend::Gpt4All),
        LocalBackend::LlamaCpp => Ok(ResolvedBackend::LlamaCpp),
        LocalBackend::Auto => {
            if !Path::new(&config.model_path).exists() {
                return Err(TierError::ModelLoadError(format!(
                    "model file not found: {}",
                    config.model_path
                )));
            }
            let magic = sniff_magic(&config.model_path)?;
            let resolved = if is_llama_magic(&magic) {
                ResolvedBackend::LlamaCpp
            } else {
                ResolvedBackend::Gpt4All
            };
            tracing::debug!(
                model = %config.model_path,
                backend = %resolved,
                "auto-resolved local backend"
            );
            Ok(resolved)
        }
    }
}
