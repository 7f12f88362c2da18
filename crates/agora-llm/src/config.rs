//! LLM provider configuration
//!
//! Reads provider choice, model, endpoint and key from the environment and
//! builds a ready-to-share provider.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::provider::LlmProvider;
use crate::resilient_provider::ResilientProvider;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which backend generates arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mock,
    Ollama,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Mock => "mock-debater",
            Self::Ollama => "llama3",
            Self::OpenAi => "gpt-4o-mini",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "ollama" => Ok(Self::Ollama),
            "openai" | "openai-compatible" => Ok(Self::OpenAi),
            other => Err(ConfigError::Invalid(format!("unknown LLM provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// env: AGORA_LLM_PROVIDER
    pub provider: ProviderKind,
    /// env: AGORA_LLM_MODEL
    pub model: String,
    /// env: OLLAMA_URL
    pub ollama_url: String,
    /// env: AGORA_LLM_BASE_URL
    pub base_url: String,
    /// env: AGORA_LLM_API_KEY, then OPENAI_API_KEY
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// env: AGORA_LLM_TIMEOUT_SECS
    pub request_timeout: Duration,
    /// env: AGORA_LLM_CIRCUIT_BREAKER
    pub circuit_breaker: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            model: ProviderKind::Mock.default_model().to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(45),
            circuit_breaker: true,
        }
    }
}

impl LlmConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// An unrecognised provider name is an error rather than a silent mock.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let provider = match env::var("AGORA_LLM_PROVIDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.provider,
        };

        Ok(Self {
            provider,
            model: env::var("AGORA_LLM_MODEL")
                .unwrap_or_else(|_| provider.default_model().to_string()),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            base_url: env::var("AGORA_LLM_BASE_URL").unwrap_or(defaults.base_url),
            api_key: env::var("AGORA_LLM_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .ok(),
            request_timeout: env::var("AGORA_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            circuit_breaker: env::var("AGORA_LLM_CIRCUIT_BREAKER")
                .map(|v| v != "0" && v != "false")
                .unwrap_or(true),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == ProviderKind::OpenAi && self.api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("AGORA_LLM_API_KEY".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        Ok(())
    }
}

fn guarded<P: LlmProvider + 'static>(provider: P, breaker: bool) -> Arc<dyn LlmProvider> {
    if breaker {
        Arc::new(ResilientProvider::wrap(provider))
    } else {
        Arc::new(provider)
    }
}

/// Build the configured provider behind an `Arc`
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    config.validate()?;
    let provider = match config.provider {
        ProviderKind::Mock => Arc::new(MockProvider::debater()) as Arc<dyn LlmProvider>,
        ProviderKind::Ollama => guarded(
            OllamaProvider::with_url(&config.ollama_url, &config.model)
                .with_timeout(config.request_timeout),
            config.circuit_breaker,
        ),
        ProviderKind::OpenAi => {
            let key = config
                .api_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingEnvVar("AGORA_LLM_API_KEY".to_string()))?;
            guarded(
                OpenAiCompatProvider::new(&config.base_url, key, &config.model)
                    .with_timeout(config.request_timeout),
                config.circuit_breaker,
            )
        }
    };
    tracing::info!(
        provider = provider.name(),
        model = %config.model,
        "LLM provider configured"
    );
    Ok(provider)
}
