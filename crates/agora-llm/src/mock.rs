//! Mock LLM provider for tests and offline runs

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResponse};

#[derive(Debug)]
enum Behaviour {
    /// Cycle through canned responses
    Canned(Vec<String>),
    /// Compose a short argument from the prompt
    Debater,
    /// Every call fails
    Failing,
}

/// A mock LLM provider that needs no network
#[derive(Debug)]
pub struct MockProvider {
    pub name: String,
    behaviour: Behaviour,
    index: AtomicUsize,
    calls: AtomicUsize,
    latency: Duration,
}

impl MockProvider {
    fn with_behaviour(name: &str, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            index: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            latency: Duration::from_millis(5),
        }
    }

    /// Create a mock that cycles through `responses`
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_behaviour("mock", Behaviour::Canned(responses))
    }

    /// Create a mock that always returns the same response
    pub fn constant(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Create a mock that speaks in character based on the prompt
    pub fn debater() -> Self {
        Self::with_behaviour("mock-debater", Behaviour::Debater)
    }

    /// Create a mock whose every call fails
    pub fn failing() -> Self {
        Self::with_behaviour("mock-failing", Behaviour::Failing)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn debater_response(request: &LlmRequest) -> String {
        if request.prompt.contains("impartial debate judge") {
            return "The exchange was lively and well reasoned. The strongest contributions \
                    tied their claims to concrete consequences and answered their opponents directly."
                .to_string();
        }

        let topic = line_value(&request.prompt, "DEBATE TOPIC:").unwrap_or("this question");
        let speaker = request
            .prompt
            .lines()
            .find_map(|l| l.strip_prefix("As ").and_then(|rest| rest.split(',').next()))
            .unwrap_or("a debater");

        format!(
            "On {}, the case made by {} is simple: we should weigh the real consequences for \
             people before committing to a position. The burden of proof lies with those who want change.",
            topic.trim_end_matches('?'),
            speaker
        )
    }
}

fn line_value<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(prefix))
        .map(str::trim)
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_available(&self) -> bool {
        !matches!(self.behaviour, Behaviour::Failing)
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();
        self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(self.latency).await;

        let content = match &self.behaviour {
            Behaviour::Failing => {
                return Err(LlmError::RequestFailed("mock provider set to fail".into()))
            }
            Behaviour::Debater => Self::debater_response(&request),
            Behaviour::Canned(responses) if responses.is_empty() => String::new(),
            Behaviour::Canned(responses) => {
                let idx = self.index.fetch_add(1, Ordering::Relaxed);
                responses[idx % responses.len()].clone()
            }
        };

        Ok(LlmResponse {
            tokens_used: Some((content.len() / 4) as u32 + 1),
            content,
            model: self.name.clone(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_constant_and_cycling() {
        let mock = MockProvider::constant("Hello, world!");
        assert_eq!(mock.ask("test").await.unwrap(), "Hello, world!");

        let mock = MockProvider::new(vec!["one".into(), "two".into()]);
        assert_eq!(mock.ask("a").await.unwrap(), "one");
        assert_eq!(mock.ask("b").await.unwrap(), "two");
        assert_eq!(mock.ask("c").await.unwrap(), "one");
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_debater_uses_topic_and_speaker() {
        let mock = MockProvider::debater();
        let prompt = "DEBATE TOPIC: Should homework be banned?\n\nAs The Scientist, provide your round 1 argument.";
        let reply = mock.ask(prompt).await.unwrap();
        assert!(reply.contains("Should homework be banned"));
        assert!(reply.contains("The Scientist"));
    }

    #[tokio::test]
    async fn test_failing() {
        let mock = MockProvider::failing();
        assert!(mock.ask("anything").await.is_err());
        assert!(!mock.is_available().await);
    }
}
