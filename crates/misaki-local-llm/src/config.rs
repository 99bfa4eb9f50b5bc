//! Configuration for the local inference tier

use misaki_foundation::config::{ConfigurationError, env_optional, parse_positive_u64};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Local backend selection. `Auto` resolves once at load time by sniffing
/// the model artifact, never by runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalBackend {
    Auto,
    Gpt4All,
    LlamaCpp,
}

impl LocalBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalBackend::Auto => "auto",
            LocalBackend::Gpt4All => "gpt4all",
            LocalBackend::LlamaCpp => "llama.cpp",
        }
    }
}

impl fmt::Display for LocalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocalBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LocalBackend::Auto),
            "gpt4all" => Ok(LocalBackend::Gpt4All),
            "llama" | "llama.cpp" => Ok(LocalBackend::LlamaCpp),
            _ => Err(()),
        }
    }
}

/// Configuration for the local provider and its engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalLlmConfig {
    /// Backend, or `Auto` to resolve from the model artifact
    pub backend: LocalBackend,

    /// Path to the model weights file (GGUF, GGML, or GPT4All `.bin`)
    pub model_path: String,

    /// Maximum tokens to generate per call
    pub max_tokens: u32,

    /// Sampling temperature (0.0 = greedy, reproducible output)
    pub temperature: f32,

    /// CPU threads for inference. `None` uses all logical cores.
    pub num_threads: Option<usize>,

    /// Per-call inference timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for LocalLlmConfig {
    fn default() -> Self {
        Self {
            backend: LocalBackend::Auto,
            model_path: String::new(),
            max_tokens: 256,
            temperature: 0.7,
            num_threads: None,
            timeout_secs: 30,
        }
    }
}

impl LocalLlmConfig {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// Read the local tier configuration from the environment
    /// (`LOCAL_LLM_BACKEND`, `LOCAL_LLM_MODEL`, `LOCAL_LLM_MAX_TOKENS`,
    /// `LOCAL_LLM_TEMPERATURE`, `LOCAL_LLM_THREADS`,
    /// `LOCAL_LLM_TIMEOUT_SECS`). Fails fast on anything invalid.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let backend = match env_optional("LOCAL_LLM_BACKEND") {
            None => LocalBackend::Auto,
            Some(raw) => {
                raw.parse()
                    .map_err(|_| ConfigurationError::InvalidValue {
                        name: "LOCAL_LLM_BACKEND",
                        value: raw,
                        reason: "expected auto, gpt4all, or llama.cpp",
                    })?
            }
        };

        let model_path = env_optional("LOCAL_LLM_MODEL")
            .ok_or(ConfigurationError::Missing("LOCAL_LLM_MODEL"))?;

        let max_tokens = match env_optional("LOCAL_LLM_MAX_TOKENS") {
            None => 256,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigurationError::InvalidValue {
                    name: "LOCAL_LLM_MAX_TOKENS",
                    value: raw,
                    reason: "expected a positive integer",
                })?,
        };

        let temperature = match env_optional("LOCAL_LLM_TEMPERATURE") {
            None => 0.7,
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| (0.0..=2.0).contains(v))
                .ok_or(ConfigurationError::InvalidValue {
                    name: "LOCAL_LLM_TEMPERATURE",
                    value: raw,
                    reason: "expected a float in [0, 2]",
                })?,
        };

        let num_threads = match env_optional("LOCAL_LLM_THREADS") {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or(ConfigurationError::InvalidValue {
                        name: "LOCAL_LLM_THREADS",
                        value: raw,
                        reason: "expected a positive integer",
                    })?,
            ),
        };

        let timeout_secs = parse_positive_u64(
            "LOCAL_LLM_TIMEOUT_SECS",
            env_optional("LOCAL_LLM_TIMEOUT_SECS"),
            30,
        )?;

        let config = Self {
            backend,
            model_path,
            max_tokens,
            temperature,
            num_threads,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_backend(mut self, backend: LocalBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Result<Self, ConfigurationError> {
        if tokens == 0 {
            return Err(ConfigurationError::InvalidValue {
                name: "max_tokens",
                value: tokens.to_string(),
                reason: "expected a positive integer",
            });
        }
        self.max_tokens = tokens;
        Ok(self)
    }

    pub fn with_temperature(mut self, temp: f32) -> Result<Self, ConfigurationError> {
        if !(0.0..=2.0).contains(&temp) {
            return Err(ConfigurationError::InvalidValue {
                name: "temperature",
                value: temp.to_string(),
                reason: "expected a float in [0, 2]",
            });
        }
        self.temperature = temp;
        Ok(self)
    }

    pub fn with_num_threads(mut self, threads: usize) -> Result<Self, ConfigurationError> {
        if threads == 0 {
            return Err(ConfigurationError::InvalidValue {
                name: "num_threads",
                value: threads.to_string(),
                reason: "expected a positive integer",
            });
        }
        self.num_threads = Some(threads);
        Ok(self)
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.model_path.trim().is_empty() {
            return Err(ConfigurationError::Missing("LOCAL_LLM_MODEL"));
        }
        if self.max_tokens == 0 {
            return Err(ConfigurationError::InvalidValue {
                name: "LOCAL_LLM_MAX_TOKENS",
                value: self.max_tokens.to_string(),
                reason: "expected a positive integer",
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigurationError::InvalidValue {
                name: "LOCAL_LLM_TEMPERATURE",
                value: self.temperature.to_string(),
                reason: "expected a float in [0, 2]",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = LocalLlmConfig::default();
        assert_eq!(cfg.backend, LocalBackend::Auto);
        assert_eq!(cfg.max_tokens, 256);
        assert_eq!(cfg.temperature, 0.7);
        assert!(cfg.num_threads.is_none());
        assert_eq!(cfg.timeout_secs, 30);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("auto".parse(), Ok(LocalBackend::Auto));
        assert_eq!("GPT4ALL".parse(), Ok(LocalBackend::Gpt4All));
        assert_eq!("llama.cpp".parse(), Ok(LocalBackend::LlamaCpp));
        assert_eq!("llama".parse(), Ok(LocalBackend::LlamaCpp));
        assert_eq!("mlx".parse::<LocalBackend>(), Err(()));
    }

    #[test]
    fn test_builder_rejects_invalid_ranges() {
        assert!(LocalLlmConfig::new("/models/x.gguf").with_max_tokens(0).is_err());
        assert!(
            LocalLlmConfig::new("/models/x.gguf")
                .with_temperature(2.5)
                .is_err()
        );
        assert!(LocalLlmConfig::new("/models/x.gguf").with_num_threads(0).is_err());
    }

    #[test]
    fn test_builder_accepts_valid_ranges() {
        let cfg = LocalLlmConfig::new("/models/x.gguf")
            .with_backend(LocalBackend::LlamaCpp)
            .with_max_tokens(512)
            .unwrap()
            .with_temperature(0.0)
            .unwrap()
            .with_num_threads(4)
            .unwrap()
            .with_timeout(5);
        assert_eq!(cfg.backend, LocalBackend::LlamaCpp);
        assert_eq!(cfg.max_tokens, 512);
        assert_eq!(cfg.temperature, 0.0);
        assert_eq!(cfg.num_threads, Some(4));
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn test_validate_requires_model_path() {
        let cfg = LocalLlmConfig::default();
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigurationError::Missing("LOCAL_LLM_MODEL")
        );
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let cfg = LocalLlmConfig::new("/models/misaki-7b.gguf").with_backend(LocalBackend::Gpt4All);
        let json = serde_json::to_string(&cfg).expect("serialize");
        let back: LocalLlmConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.model_path, "/models/misaki-7b.gguf");
        assert_eq!(back.backend, LocalBackend::Gpt4All);
    }
}
