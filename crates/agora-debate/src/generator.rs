//! The text-generation capability behind debaters and the judge

use std::fmt::Debug;
use std::sync::Arc;

use agora_core::Debate;
use agora_llm::{LlmProvider, LlmRequest, Metrics};
use async_trait::async_trait;
use tracing::debug;

use crate::error::GenerationError;
use crate::prompt::{judge_prompt, ArgumentRequest};

const ARGUMENT_TEMPERATURE: f32 = 0.8;
const ARGUMENT_MAX_TOKENS: u32 = 160;
const JUDGE_TEMPERATURE: f32 = 0.7;
const JUDGE_MAX_TOKENS: u32 = 200;
const TOP_P: f32 = 0.9;
const ARGUMENT_REPETITION_PENALTY: f32 = 1.1;
const JUDGE_SYSTEM: &str = "You are an impartial debate judge.";

/// Produces raw argument and analysis text.
///
/// Output is cleaned and length-checked by the caller, and any error is
/// replaced by a template, so implementations may fail freely.
#[async_trait]
pub trait ArgumentGenerator: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn generate(&self, request: &ArgumentRequest) -> Result<String, GenerationError>;

    async fn judge_analysis(
        &self,
        debate: &Debate,
        winner: Option<&str>,
    ) -> Result<String, GenerationError>;
}

/// Generator backed by any [`LlmProvider`]
#[derive(Debug, Clone)]
pub struct LlmArgumentGenerator {
    provider: Arc<dyn LlmProvider>,
    metrics: Arc<Metrics>,
}

impl LlmArgumentGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, metrics: Arc<Metrics>) -> Self {
        Self { provider, metrics }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    async fn complete(&self, request: LlmRequest) -> Result<String, GenerationError> {
        match self.provider.complete(request).await {
            Ok(response) => {
                self.metrics
                    .record_llm_call(response.tokens_used.unwrap_or(0) as u64, false);
                debug!(
                    provider = self.provider.name(),
                    latency_ms = response.latency_ms,
                    tokens = ?response.tokens_used,
                    "completion received"
                );
                Ok(response.content)
            }
            Err(e) => {
                self.metrics.record_llm_call(0, true);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl ArgumentGenerator for LlmArgumentGenerator {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn generate(&self, request: &ArgumentRequest) -> Result<String, GenerationError> {
        let llm_request = LlmRequest::with_role(&request.personality.system_prompt, &request.prompt())
            .temperature(ARGUMENT_TEMPERATURE)
            .top_p(TOP_P)
            .repetition_penalty(ARGUMENT_REPETITION_PENALTY)
            .max_tokens(ARGUMENT_MAX_TOKENS);
        self.complete(llm_request).await
    }

    async fn judge_analysis(
        &self,
        debate: &Debate,
        _winner: Option<&str>,
    ) -> Result<String, GenerationError> {
        let llm_request = LlmRequest::with_role(JUDGE_SYSTEM, &judge_prompt(debate))
            .temperature(JUDGE_TEMPERATURE)
            .top_p(TOP_P)
            .max_tokens(JUDGE_MAX_TOKENS);
        self.complete(llm_request).await
    }
}
