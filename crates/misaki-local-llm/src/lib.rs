//! # misaki-local-llm
//!
//! Local small-model tier for Misaki: backend selection (GPT4All /
//! llama.cpp), the warm model cache that amortizes expensive loads across
//! invocations of the same execution context, and the provider that plugs
//! the local tier into the escalation chain.
//!
//! The model cache holds at most one warm engine per configured model
//! identity; a backend or model-path change drops the old handle and loads
//! the replacement lazily on next use. Loading is single-flight: concurrent
//! callers wait on the in-flight load instead of duplicating it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use misaki_local_llm::{LocalLlmConfig, LocalProvider, ModelCache};
//! use std::sync::Arc;
//!
//! let config = LocalLlmConfig::from_env()?;
//! let cache = Arc::new(ModelCache::new());
//! let provider = LocalProvider::new(config, cache)?;
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod engine;
pub mod provider;

pub use backend::ResolvedBackend;
pub use cache::{BackendLoader, ModelCache, ModelKey, ModelLoader};
pub use config::{LocalBackend, LocalLlmConfig};
pub use engine::{EngineMetadata, InferenceEngine, ModelHandle};
pub use provider::LocalProvider;
