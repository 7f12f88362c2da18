//! Local models served by Ollama (`/api/generate`)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: String,
    system: String,
    stream: bool,
    options: SamplingOptions,
}

/// Ollama's `options` object; absent keys keep the model's own defaults
#[derive(Debug, Serialize)]
struct SamplingOptions {
    temperature: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

impl From<&LlmRequest> for SamplingOptions {
    fn from(request: &LlmRequest) -> Self {
        Self {
            temperature: request.temperature,
            num_predict: request.max_tokens,
            top_p: request.top_p,
            repeat_penalty: request.repetition_penalty,
            stop: request.stop.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    response: String,
    model: String,
    /// Tokens in the prompt
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    /// Tokens generated
    #[serde(default)]
    eval_count: Option<u32>,
}

impl GenerateReply {
    fn tokens(&self) -> Option<u32> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (p, e) => Some(p.unwrap_or(0) + e.unwrap_or(0)),
        }
    }
}

#[derive(Debug)]
pub struct OllamaProvider {
    base_url: String,
    /// e.g. "llama3", "mistral"
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(model: &str) -> Self {
        Self::with_url("http://localhost:11434", model)
    }

    pub fn with_url(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Bound every HTTP call to `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        self
    }

    fn body(&self, request: LlmRequest) -> GenerateBody<'_> {
        let options = SamplingOptions::from(&request);
        GenerateBody {
            model: &self.model,
            prompt: request.prompt,
            system: request.system,
            stream: false,
            options,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::TOO_MANY_REQUESTS => return Err(LlmError::RateLimited),
            reqwest::StatusCode::NOT_FOUND => {
                return Err(LlmError::RequestFailed(format!(
                    "model '{}' is not pulled on {}",
                    self.model, self.base_url
                )))
            }
            s => return Err(LlmError::RequestFailed(format!("Status: {}", s))),
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(LlmResponse {
            tokens_used: reply.tokens(),
            content: reply.response,
            model: reply.model,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}
