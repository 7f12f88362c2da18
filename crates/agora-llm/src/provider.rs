//! LLM provider trait and common types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Provider not available")]
    NotAvailable,
}

impl LlmError {
    /// Errors that say the backend itself is unhealthy, as opposed to a bad request
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::NotAvailable | Self::RateLimited
        )
    }
}

/// One completion: a persona, the turn prompt and sampling controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Persona the model speaks as
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Nucleus sampling cutoff; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Penalty for repeated tokens, 1.0 meaning none. Only honoured by Ollama.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
    /// Generation stops at the first of these
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl LlmRequest {
    /// Bare prompt with a neutral persona
    pub fn simple(prompt: &str) -> Self {
        Self::with_role("You are a concise assistant.", prompt)
    }

    pub fn with_role(system: &str, prompt: &str) -> Self {
        Self {
            system: system.to_string(),
            prompt: prompt.to_string(),
            temperature: 0.7,
            max_tokens: 512,
            top_p: None,
            repetition_penalty: None,
            stop: Vec::new(),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p.clamp(0.0, 1.0));
        self
    }

    pub fn repetition_penalty(mut self, penalty: f32) -> Self {
        self.repetition_penalty = Some(penalty.max(0.0));
        self
    }

    pub fn stop_at(mut self, marker: impl Into<String>) -> Self {
        self.stop.push(marker.into());
        self
    }
}

/// A finished completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    /// Model that answered, as reported by the backend
    pub model: String,
    /// Unknown for backends that do not report usage
    pub tokens_used: Option<u32>,
    pub latency_ms: u64,
}

/// A text-generation backend
#[async_trait]
pub trait LlmProvider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Cheap reachability check
    async fn is_available(&self) -> bool;

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    async fn ask(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.complete(LlmRequest::simple(prompt)).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps_sampling() {
        let request = LlmRequest::with_role("You are The Skeptic.", "Argue.")
            .temperature(3.5)
            .top_p(1.7)
            .max_tokens(0)
            .repetition_penalty(1.1)
            .stop_at("\n\n");
        assert_eq!(request.temperature, 2.0);
        assert_eq!(request.top_p, Some(1.0));
        assert_eq!(request.max_tokens, 1);
        assert_eq!(request.repetition_penalty, Some(1.1));
        assert_eq!(request.stop, vec!["\n\n".to_string()]);
    }

    #[test]
    fn test_unset_sampling_is_omitted_from_json() {
        let json = serde_json::to_value(LlmRequest::simple("hi")).unwrap();
        assert!(json.get("top_p").is_none());
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_availability_errors() {
        assert!(LlmError::RateLimited.is_availability());
        assert!(LlmError::ConnectionFailed("refused".into()).is_availability());
        assert!(!LlmError::InvalidResponse("garbled".into()).is_availability());
    }
}
