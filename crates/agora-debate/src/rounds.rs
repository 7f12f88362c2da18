//! Round generation on a bounded worker pool with a hard deadline

use std::sync::Arc;
use std::time::{Duration, Instant};

use agora_core::{Argument, Personality};
use agora_llm::Metrics;
use rand::seq::SliceRandom;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::error::DebateError;
use crate::fallback::fallback_argument;
use crate::generator::ArgumentGenerator;
use crate::prompt::{previous_rounds, ArgumentRequest};
use crate::text::{finish_argument, truncate_chars};

/// Input for one round
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub topic: String,
    pub round: u32,
    /// Arguments already committed to the debate
    pub prior: Vec<Argument>,
    pub speakers: Vec<Personality>,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    min: usize,
    max: usize,
}

/// Runs rounds, at most `pool_size` at a time across all debates
#[derive(Debug, Clone)]
pub struct RoundRunner {
    generator: Arc<dyn ArgumentGenerator>,
    pool: Arc<Semaphore>,
    timeout: Duration,
    limits: Limits,
    metrics: Arc<Metrics>,
}

impl RoundRunner {
    pub fn new(
        generator: Arc<dyn ArgumentGenerator>,
        pool_size: usize,
        timeout: Duration,
        min_length: usize,
        max_length: usize,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            generator,
            pool: Arc::new(Semaphore::new(pool_size.max(1))),
            timeout,
            limits: Limits {
                min: min_length,
                max: max_length,
            },
            metrics,
        }
    }

    /// Free pool permits right now
    pub fn available_permits(&self) -> usize {
        self.pool.available_permits()
    }

    /// Generate one argument per speaker.
    ///
    /// The round runs on its own task. If it misses the deadline the task is
    /// aborted and nothing is returned, so the caller commits nothing.
    pub async fn run(&self, plan: RoundPlan) -> Result<Vec<Argument>, DebateError> {
        let round = plan.round;
        let started = Instant::now();
        let generator = self.generator.clone();
        let pool = self.pool.clone();
        let limits = self.limits;

        let mut handle = tokio::spawn(async move {
            let _permit = pool
                .acquire_owned()
                .await
                .map_err(|_| "worker pool closed".to_string())?;
            Ok::<_, String>(generate_round(generator.as_ref(), plan, limits).await)
        });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(Ok((arguments, fallbacks)))) => {
                self.metrics.record_round(fallbacks);
                info!(
                    round,
                    arguments = arguments.len(),
                    fallbacks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Round generated"
                );
                Ok(arguments)
            }
            Ok(Ok(Err(reason))) => {
                error!(round, %reason, "Round could not run");
                Err(DebateError::GenerationFailure(reason))
            }
            Ok(Err(join_error)) => {
                error!(round, error = %join_error, "Round task failed");
                Err(DebateError::GenerationFailure(format!(
                    "round {} task failed: {}",
                    round, join_error
                )))
            }
            Err(_) => {
                handle.abort();
                error!(round, timeout_secs = self.timeout.as_secs_f64(), "Round timed out, abandoned");
                Err(DebateError::GenerationFailure(format!(
                    "round {} timed out after {:?}",
                    round, self.timeout
                )))
            }
        }
    }
}

/// Sequential generation in shuffled order; failures become templates
async fn generate_round(
    generator: &dyn ArgumentGenerator,
    plan: RoundPlan,
    limits: Limits,
) -> (Vec<Argument>, u64) {
    let RoundPlan {
        topic,
        round,
        prior,
        mut speakers,
    } = plan;
    {
        let mut rng = rand::rng();
        speakers.shuffle(&mut rng);
    }

    let history = previous_rounds(&prior, round);
    let mut produced: Vec<Argument> = Vec::with_capacity(speakers.len());
    let mut fallbacks = 0;

    for personality in speakers {
        let request = ArgumentRequest {
            topic: topic.clone(),
            round,
            history: history.clone(),
            said_this_round: produced
                .iter()
                .map(|a| (a.personality_id.clone(), a.content.clone()))
                .collect(),
            personality,
        };

        let outcome = match generator.generate(&request).await {
            Ok(raw) => finish_argument(&raw, limits.min, limits.max),
            Err(e) => Err(e),
        };
        let content = match outcome {
            Ok(text) => {
                debug!(speaker = request.speaker(), round, chars = text.chars().count(), "argument generated");
                text
            }
            Err(e) => {
                warn!(speaker = request.speaker(), round, error = %e, "Generation failed, using fallback");
                fallbacks += 1;
                truncate_chars(&fallback_argument(request.speaker(), &topic), limits.max)
            }
        };
        produced.push(Argument::new(request.personality.name, content, round));
    }
    (produced, fallbacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::LlmArgumentGenerator;
    use agora_llm::MockProvider;
    use std::collections::HashSet;

    fn runner(provider: MockProvider, timeout: Duration) -> RoundRunner {
        let metrics = Arc::new(Metrics::new());
        let generator = LlmArgumentGenerator::new(Arc::new(provider), metrics.clone());
        RoundRunner::new(Arc::new(generator), 2, timeout, 20, 500, metrics)
    }

    fn plan(round: u32) -> RoundPlan {
        RoundPlan {
            topic: "Should cities ban cars?".into(),
            round,
            prior: Vec::new(),
            speakers: ["The Philosopher", "The Scientist", "The Historian"]
                .iter()
                .map(|n| Personality::bare(*n))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_one_argument_per_speaker() {
        let runner = runner(MockProvider::debater(), Duration::from_secs(5));
        let arguments = runner.run(plan(2)).await.unwrap();

        assert_eq!(arguments.len(), 3);
        let speakers: HashSet<_> = arguments.iter().map(|a| a.personality_id.as_str()).collect();
        assert_eq!(speakers.len(), 3);
        assert!(arguments.iter().all(|a| a.round_number == 2));
        assert_eq!(runner.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_short_output_falls_back() {
        let runner = runner(MockProvider::constant("Yes."), Duration::from_secs(5));
        let arguments = runner.run(plan(1)).await.unwrap();

        assert_eq!(arguments.len(), 3);
        for argument in &arguments {
            assert!(argument.content.contains("Should cities ban cars?"), "{}", argument.content);
        }
        assert_eq!(runner.metrics.snapshot().fallback_arguments, 3);
    }

    #[tokio::test]
    async fn test_timeout_abandons_round() {
        let slow = MockProvider::debater().with_latency(Duration::from_millis(500));
        let runner = runner(slow, Duration::from_millis(50));

        let result = runner.run(plan(1)).await;
        assert!(matches!(result, Err(DebateError::GenerationFailure(ref m)) if m.contains("timed out")));
        assert_eq!(runner.metrics.snapshot().rounds_generated, 0);
    }
}
