//! The debate lifecycle engine
//!
//! Every transition follows the same shape: read the debate, check the rule on
//! the snapshot, do any slow work (generation) without holding anything, then
//! commit with a compare-and-swap that re-checks the rule against the freshest
//! document. A caller that loses the race gets the rule's refusal and nothing
//! it produced is written.

use std::sync::Arc;

use agora_core::analytics::analyze;
use agora_core::{
    Argument, Debate, DebateAnalytics, DebateResult, DebateStatus, RoundStep, RuleViolation,
};
use agora_llm::Metrics;
use agora_persist::{DebatePage, DebateStore, KeyedLocks, StorageBackend, UpdateError};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::DebateConfig;
use crate::error::DebateError;
use crate::fallback::fallback_judge_analysis;
use crate::generator::ArgumentGenerator;
use crate::registry::PersonalityRegistry;
use crate::rounds::{RoundPlan, RoundRunner};
use crate::text::{clean_argument, truncate_chars};

/// Arguments committed by a start or advance call
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoundReport {
    pub round: u32,
    pub debate: Debate,
    pub arguments: Vec<Argument>,
}

/// What an advance call did
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    Round(RoundReport),
    /// Rounds were exhausted and the debate is now completed
    Ended(Debate),
}

/// Platform-wide counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlatformStats {
    pub total_debates: usize,
    pub active_debates: usize,
    pub completed_debates: usize,
    pub judged_debates: usize,
    pub total_personalities: usize,
    pub total_arguments: usize,
}

#[derive(Debug)]
pub struct DebateEngine {
    debates: DebateStore<dyn StorageBackend>,
    registry: PersonalityRegistry,
    rounds: RoundRunner,
    generator: Arc<dyn ArgumentGenerator>,
    config: DebateConfig,
    metrics: Arc<Metrics>,
    /// One stats settlement per debate at a time
    settling: KeyedLocks,
}

fn lift(id: Uuid) -> impl FnOnce(UpdateError<RuleViolation>) -> DebateError {
    move |err| match err {
        UpdateError::NotFound(_) => DebateError::debate_not_found(id),
        other => other.into(),
    }
}

impl DebateEngine {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        generator: Arc<dyn ArgumentGenerator>,
        config: DebateConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let rounds = RoundRunner::new(
            generator.clone(),
            config.worker_pool_size,
            config.round_timeout,
            config.min_argument_length,
            config.max_argument_length,
            metrics.clone(),
        );
        Self {
            debates: DebateStore::new(backend.clone()).with_attempts(config.cas_attempts),
            registry: PersonalityRegistry::new(backend, config.cas_attempts),
            rounds,
            generator,
            config,
            metrics,
            settling: KeyedLocks::new(),
        }
    }

    pub fn registry(&self) -> &PersonalityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub async fn storage_healthy(&self) -> bool {
        self.debates.backend().is_healthy().await
    }

    /// New debate in `created` with the whole current roster
    pub async fn create(
        &self,
        topic: &str,
        creator_id: Option<String>,
    ) -> Result<Debate, DebateError> {
        let roster = self.registry.debate_roster().await?;
        let debate = Debate::new(topic.trim(), creator_id, roster, self.config.max_rounds)?;
        self.debates.insert(&debate).await?;
        self.metrics.record_debate_created();
        info!(
            debate_id = %debate.id,
            participants = debate.participants.len(),
            status = %debate.status,
            "Debate created"
        );
        Ok(debate)
    }

    /// `created → in_progress`, committing round one
    pub async fn start(&self, id: Uuid) -> Result<RoundReport, DebateError> {
        let debate = self.get(id).await?;
        debate.ensure_can_start()?;

        let arguments = self.generate(&debate, 1).await?;
        let (debate, ()) = self
            .debates
            .update(id, |d| d.begin(arguments.clone()))
            .await
            .map_err(|e| {
                if matches!(e, UpdateError::Rejected(_)) {
                    warn!(debate_id = %id, "Start lost to a concurrent transition");
                }
                lift(id)(e)
            })?;

        info!(debate_id = %id, round = 1, status = %debate.status, "Debate started");
        Ok(RoundReport {
            round: 1,
            debate,
            arguments,
        })
    }

    /// Generate the next round, or complete the debate when rounds are exhausted
    pub async fn advance_round(&self, id: Uuid) -> Result<AdvanceOutcome, DebateError> {
        let debate = self.get(id).await?;
        match debate.next_step()? {
            RoundStep::Complete => {
                let (debate, ()) = self
                    .debates
                    .update(id, |d| match d.next_step()? {
                        RoundStep::Complete => d.complete(),
                        RoundStep::Generate(_) => Err(RuleViolation::invalid(
                            "debate still has rounds to generate",
                        )),
                    })
                    .await
                    .map_err(lift(id))?;
                info!(debate_id = %id, round = debate.current_round, status = %debate.status, "Debate completed after final round");
                Ok(AdvanceOutcome::Ended(debate))
            }
            RoundStep::Generate(next) => {
                let from_round = debate.current_round;
                let arguments = self.generate(&debate, next).await?;
                let (debate, ()) = self
                    .debates
                    .update(id, |d| d.advance(from_round, arguments.clone()))
                    .await
                    .map_err(|e| {
                        if matches!(e, UpdateError::Rejected(_)) {
                            warn!(debate_id = %id, round = next, "Advance lost to a concurrent transition");
                        }
                        lift(id)(e)
                    })?;
                info!(debate_id = %id, round = next, status = %debate.status, "Round committed");
                Ok(AdvanceOutcome::Round(RoundReport {
                    round: next,
                    debate,
                    arguments,
                }))
            }
        }
    }

    /// `in_progress → completed` on request
    pub async fn end(&self, id: Uuid) -> Result<Debate, DebateError> {
        let (debate, ()) = self
            .debates
            .update(id, |d| d.complete())
            .await
            .map_err(lift(id))?;
        info!(debate_id = %id, round = debate.current_round, status = %debate.status, "Debate ended");
        Ok(debate)
    }

    /// Record the verdict, then fold the result into every participant's stats.
    ///
    /// Without `reasoning` the generator writes an analysis. Stats are updated
    /// only after the verdict is committed, so a rejected judge call never
    /// touches them. A repeat call on a judged debate still answers
    /// `AlreadyJudged`, but first finishes any stats a failed earlier call
    /// left pending.
    pub async fn judge(
        &self,
        id: Uuid,
        winner: &str,
        reasoning: Option<String>,
        judge_id: Option<String>,
    ) -> Result<Debate, DebateError> {
        let debate = self.get(id).await?;
        if let Err(violation) = debate.ensure_can_judge(winner) {
            if violation == RuleViolation::AlreadyJudged && !debate.pending_stats.is_empty() {
                warn!(debate_id = %id, pending = debate.pending_stats.len(), "Finishing stats left by an earlier verdict");
                self.settle_stats(id).await?;
            }
            return Err(violation.into());
        }

        let reasoning = match reasoning.filter(|r| !r.trim().is_empty()) {
            Some(r) => r,
            None => self.judge_analysis(&debate, winner).await,
        };

        let (debate, ()) = self
            .debates
            .update(id, |d| d.judge(winner, Some(reasoning.clone()), judge_id.clone()))
            .await
            .map_err(lift(id))?;
        self.metrics.record_judged();
        info!(debate_id = %id, winner, status = %debate.status, "Debate judged");

        self.settle_stats(id).await
    }

    /// Write the judged result of every participant still in `pending_stats`.
    ///
    /// Each participant leaves the pending set only after its stats are
    /// written, and settling one debate is serialized, so repeated calls count
    /// every participant once. A debate with nothing pending is returned as is.
    pub async fn settle_stats(&self, id: Uuid) -> Result<Debate, DebateError> {
        let _settling = self.settling.lock(&id.to_string()).await;
        let mut debate = self.get(id).await?;
        let winner = debate.winner.clone();
        let mut first_error = None;

        for name in debate.pending_stats.clone() {
            let result = DebateResult {
                won: winner.as_deref() == Some(name.as_str()),
                votes_received: debate.votes_for(&name),
                arguments_contributed: debate.arguments_by(&name).count() as u64,
            };
            match self.registry.record_result(&name, result).await {
                Ok(_) => {}
                Err(DebateError::NotFound { .. }) => {
                    warn!(debate_id = %id, personality = %name, "Participant no longer registered, stats skipped");
                }
                Err(e) => {
                    error!(debate_id = %id, personality = %name, error = %e, "Failed to record result, left pending");
                    first_error.get_or_insert(e);
                    continue;
                }
            }

            match self
                .debates
                .update::<_, RuleViolation, _>(id, |d| Ok(d.mark_stats_recorded(&name)))
                .await
                .map_err(lift(id))
            {
                Ok((fresh, _)) => debate = fresh,
                Err(e) => {
                    error!(debate_id = %id, personality = %name, error = %e, "Stats written but still marked pending");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(debate), Err)
    }

    async fn judge_analysis(&self, debate: &Debate, winner: &str) -> String {
        let fallback = || fallback_judge_analysis(&debate.topic, Some(winner));
        let generated = tokio::time::timeout(
            self.config.round_timeout,
            self.generator.judge_analysis(debate, Some(winner)),
        )
        .await;
        match generated {
            Ok(Ok(raw)) => {
                let cleaned = clean_argument(&raw);
                if cleaned.is_empty() {
                    fallback()
                } else {
                    truncate_chars(&cleaned, self.config.max_argument_length)
                }
            }
            Ok(Err(e)) => {
                warn!(debate_id = %debate.id, error = %e, "Judge analysis failed, using fallback");
                fallback()
            }
            Err(_) => {
                warn!(
                    debate_id = %debate.id,
                    timeout_secs = self.config.round_timeout.as_secs(),
                    "Judge analysis timed out, using fallback"
                );
                fallback()
            }
        }
    }

    /// One vote per voter per debate
    pub async fn vote(
        &self,
        id: Uuid,
        participant: &str,
        voter_id: &str,
        argument_id: Option<Uuid>,
    ) -> Result<Debate, DebateError> {
        let outcome = self
            .debates
            .update(id, |d| d.record_vote(participant, voter_id, argument_id))
            .await
            .map_err(lift(id));

        match outcome {
            Ok((debate, ())) => {
                self.metrics.record_vote();
                info!(debate_id = %id, participant, total_votes = debate.total_votes, "Vote recorded");
                Ok(debate)
            }
            Err(DebateError::DuplicateVote { voter_id }) => {
                warn!(debate_id = %id, %voter_id, "Duplicate vote rejected");
                Err(DebateError::DuplicateVote { voter_id })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Debate, DebateError> {
        self.debates
            .load(id)
            .await?
            .ok_or_else(|| DebateError::debate_not_found(id))
    }

    pub async fn list(
        &self,
        page: usize,
        limit: usize,
        status: Option<DebateStatus>,
    ) -> Result<DebatePage, DebateError> {
        Ok(self.debates.page(page, limit, status).await?)
    }

    pub async fn count(&self, status: Option<DebateStatus>) -> Result<usize, DebateError> {
        Ok(self.debates.count(status).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DebateError> {
        if !self.debates.delete(id).await? {
            return Err(DebateError::debate_not_found(id));
        }
        info!(debate_id = %id, "Debate deleted");
        Ok(())
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<Debate>, DebateError> {
        Ok(self.debates.recent(limit).await?)
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Debate>, DebateError> {
        Ok(self.debates.search(query, limit).await?)
    }

    pub async fn total_arguments(&self) -> Result<usize, DebateError> {
        Ok(self.debates.total_arguments().await?)
    }

    pub async fn analytics(&self, id: Uuid) -> Result<DebateAnalytics, DebateError> {
        Ok(analyze(&self.get(id).await?))
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats, DebateError> {
        let debates = self.debates.load_all().await?;
        let with_status = |s: DebateStatus| debates.iter().filter(|d| d.status == s).count();
        Ok(PlatformStats {
            total_debates: debates.len(),
            active_debates: with_status(DebateStatus::InProgress),
            completed_debates: with_status(DebateStatus::Completed),
            judged_debates: with_status(DebateStatus::Judged),
            total_personalities: self.registry.count().await?,
            total_arguments: debates.iter().map(|d| d.arguments.len()).sum(),
        })
    }

    async fn generate(&self, debate: &Debate, round: u32) -> Result<Vec<Argument>, DebateError> {
        let speakers = self.registry.resolve(&debate.participants).await?;
        self.rounds
            .run(RoundPlan {
                topic: debate.topic.clone(),
                round,
                prior: debate.arguments.clone(),
                speakers,
            })
            .await
            .inspect_err(|e| error!(debate_id = %debate.id, round, error = %e, "Round abandoned, nothing committed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::LlmArgumentGenerator;
    use agora_llm::MockProvider;
    use agora_persist::MemoryBackend;

    async fn engine() -> DebateEngine {
        let metrics = Arc::new(Metrics::new());
        let generator = LlmArgumentGenerator::new(Arc::new(MockProvider::debater()), metrics.clone());
        let engine = DebateEngine::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(generator),
            DebateConfig::default(),
            metrics,
        );
        engine.registry().seed_defaults().await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_create_snapshots_roster() {
        let engine = engine().await;
        let debate = engine.create("  Should homework be banned?  ", Some("alice".into())).await.unwrap();
        assert_eq!(debate.topic, "Should homework be banned?");
        assert_eq!(debate.participants.len(), 6);
        assert_eq!(debate.status, DebateStatus::Created);
        assert!(debate.votes.values().all(|v| *v == 0));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_roster_and_blank_topic() {
        let metrics = Arc::new(Metrics::new());
        let generator = LlmArgumentGenerator::new(Arc::new(MockProvider::debater()), metrics.clone());
        let engine = DebateEngine::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(generator),
            DebateConfig::default(),
            metrics,
        );
        assert!(matches!(
            engine.create("Should homework be banned?", None).await,
            Err(DebateError::Validation(_))
        ));

        engine.registry().seed_defaults().await.unwrap();
        assert!(matches!(engine.create("   ", None).await, Err(DebateError::Validation(_))));
    }

    #[tokio::test]
    async fn test_vote_rules() {
        let engine = engine().await;
        let debate = engine.create("Should homework be banned?", None).await.unwrap();
        let id = debate.id;

        assert!(matches!(
            engine.vote(id, "The Scientist", "v1", None).await,
            Err(DebateError::InvalidTransition(_))
        ));

        let report = engine.start(id).await.unwrap();
        let scientist_arg = report
            .arguments
            .iter()
            .find(|a| a.personality_id == "The Scientist")
            .unwrap()
            .id;

        let voted = engine.vote(id, "The Scientist", "v1", Some(scientist_arg)).await.unwrap();
        assert_eq!(voted.votes_for("The Scientist"), 1);
        assert_eq!(voted.arguments.iter().find(|a| a.id == scientist_arg).unwrap().votes, 1);

        assert!(matches!(
            engine.vote(id, "The Historian", "v1", None).await,
            Err(DebateError::DuplicateVote { .. })
        ));
        assert!(matches!(
            engine.vote(id, "Nobody", "v2", None).await,
            Err(DebateError::Validation(_))
        ));
        assert!(matches!(
            engine.vote(Uuid::new_v4(), "The Scientist", "v2", None).await,
            Err(DebateError::NotFound { kind: "debate", .. })
        ));

        let stored = engine.get(id).await.unwrap();
        assert_eq!(stored.total_votes, 1);
        assert!(stored.votes_consistent());
        assert_eq!(engine.metrics().snapshot().votes_cast, 1);
    }

    #[tokio::test]
    async fn test_judge_without_reasoning_uses_analysis() {
        let engine = engine().await;
        let id = engine.create("Should homework be banned?", None).await.unwrap().id;
        engine.start(id).await.unwrap();

        let judged = engine.judge(id, "The Advocate", None, None).await.unwrap();
        assert_eq!(judged.status, DebateStatus::Judged);
        let decision = judged.judge_decision.unwrap();
        assert!(decision.contains("well reasoned"), "{}", decision);
    }

    #[tokio::test]
    async fn test_end_then_advance_is_rejected() {
        let engine = engine().await;
        let id = engine.create("Should homework be banned?", None).await.unwrap().id;
        assert!(matches!(engine.end(id).await, Err(DebateError::InvalidTransition(_))));

        engine.start(id).await.unwrap();
        let ended = engine.end(id).await.unwrap();
        assert_eq!(ended.status, DebateStatus::Completed);
        assert!(matches!(engine.advance_round(id).await, Err(DebateError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_platform_stats() {
        let engine = engine().await;
        let first = engine.create("Should homework be banned?", None).await.unwrap();
        engine.create("Is remote work here to stay?", None).await.unwrap();
        engine.start(first.id).await.unwrap();

        let stats = engine.platform_stats().await.unwrap();
        assert_eq!(stats.total_debates, 2);
        assert_eq!(stats.active_debates, 1);
        assert_eq!(stats.judged_debates, 0);
        assert_eq!(stats.total_personalities, 6);
        assert_eq!(stats.total_arguments, 6);
        assert_eq!(engine.total_arguments().await.unwrap(), 6);
    }
}
