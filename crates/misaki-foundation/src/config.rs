//! Runtime configuration
//!
//! Environment-derived settings, read once per process start and immutable
//! afterwards. Invalid values fail construction; nothing here is re-read or
//! re-validated per request.

use std::fmt;

/// Startup-time configuration failure. Never produced mid-request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),
    #[error(
        "no answerable tier configured: set an external credential, enable the local model, or allow the static fallback"
    )]
    NoTierAvailable,
    #[error("provider {0} requires the `{1}` cargo feature")]
    FeatureDisabled(&'static str, &'static str),
}

/// Hosted provider selected for the external tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalProviderKind {
    OpenAI,
    Bedrock,
    HuggingFace,
}

impl fmt::Display for ExternalProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExternalProviderKind::OpenAI => "openai",
            ExternalProviderKind::Bedrock => "bedrock",
            ExternalProviderKind::HuggingFace => "huggingface",
        };
        f.write_str(name)
    }
}

/// Process-wide settings for the escalation chain.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Whether the local tier participates
    pub use_local_llm: bool,
    /// Whether total failure degrades to the static fallback reply
    pub allow_static_fallback: bool,
    /// OpenAI credential
    pub openai_api_key: Option<String>,
    /// AWS profile for Bedrock
    pub bedrock_credentials: Option<String>,
    /// HuggingFace credential
    pub huggingface_token: Option<String>,
    /// OpenAI-compatible endpoint override
    pub api_endpoint: Option<String>,
    /// Per-call timeout for external adapters (seconds)
    pub external_timeout_secs: u64,
}

impl Settings {
    /// Read settings from the environment, failing fast on invalid values.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let settings = Self {
            use_local_llm: parse_bool("USE_LOCAL_LLM", env_optional("USE_LOCAL_LLM"), false)?,
            allow_static_fallback: parse_bool(
                "LOCAL_LLM_ALLOW_FALLBACK",
                env_optional("LOCAL_LLM_ALLOW_FALLBACK"),
                false,
            )?,
            openai_api_key: env_optional("OPENAI_API_KEY"),
            bedrock_credentials: env_optional("BEDROCK_CREDENTIALS"),
            huggingface_token: env_optional("HUGGINGFACE_TOKEN"),
            api_endpoint: env_optional("LLM_API_ENDPOINT"),
            external_timeout_secs: parse_positive_u64(
                "EXTERNAL_LLM_TIMEOUT_SECS",
                env_optional("EXTERNAL_LLM_TIMEOUT_SECS"),
                10,
            )?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// The provider serving the external tier, by credential precedence.
    ///
    /// An explicit OpenAI-compatible endpoint counts as an OpenAI deployment
    /// even without a key (self-hosted gateways rarely need one).
    pub fn external_provider(&self) -> Option<ExternalProviderKind> {
        if self.openai_api_key.is_some() || self.api_endpoint.is_some() {
            Some(ExternalProviderKind::OpenAI)
        } else if self.bedrock_credentials.is_some() {
            Some(ExternalProviderKind::Bedrock)
        } else if self.huggingface_token.is_some() {
            Some(ExternalProviderKind::HuggingFace)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.external_provider().is_none() && !self.use_local_llm && !self.allow_static_fallback
        {
            return Err(ConfigurationError::NoTierAvailable);
        }
        Ok(())
    }
}

/// Read an environment variable, treating blank values as unset.
pub fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// Parse a boolean flag (`1/true/yes/on` and `0/false/no/off`).
pub fn parse_bool(
    name: &'static str,
    raw: Option<String>,
    default: bool,
) -> Result<bool, ConfigurationError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::InvalidValue {
            name,
            value: raw,
            reason: "expected a boolean (true/false/yes/no/1/0/on/off)",
        }),
    }
}

/// Parse a strictly positive integer.
pub fn parse_positive_u64(
    name: &'static str,
    raw: Option<String>,
    default: u64,
) -> Result<u64, ConfigurationError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigurationError::InvalidValue {
            name,
            value: raw,
            reason: "expected a positive integer",
        }),
    }
}
