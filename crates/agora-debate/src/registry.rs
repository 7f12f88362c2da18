//! Personality registry: the debate roster and its running statistics

use std::sync::Arc;

use agora_core::personality::{leaderboard, rank};
use agora_core::{
    default_personalities, DebateResult, LeaderboardEntry, Personality, PersonalityStats,
    PersonalityUpdate, RankBy, RuleViolation,
};
use agora_persist::{PersonalityStore, StorageBackend, StorageError, UpdateError};
use tracing::{info, warn};

use crate::error::DebateError;

#[derive(Debug, Clone)]
pub struct PersonalityRegistry {
    store: PersonalityStore<dyn StorageBackend>,
}

fn lift(name: &str) -> impl FnOnce(UpdateError<RuleViolation>) -> DebateError + '_ {
    move |err| match err {
        UpdateError::NotFound(_) => DebateError::personality_not_found(name),
        other => other.into(),
    }
}

impl PersonalityRegistry {
    pub fn new(backend: Arc<dyn StorageBackend>, cas_attempts: u32) -> Self {
        Self {
            store: PersonalityStore::new(backend).with_attempts(cas_attempts),
        }
    }

    /// Insert the six default personalities when the registry is empty
    pub async fn seed_defaults(&self) -> Result<usize, DebateError> {
        Ok(self.store.seed_if_empty(&default_personalities()).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<Personality>, DebateError> {
        Ok(self.store.load_all().await?)
    }

    pub async fn count(&self) -> Result<usize, DebateError> {
        Ok(self.store.count().await?)
    }

    /// Names of everyone who takes part in a new debate
    pub async fn debate_roster(&self) -> Result<Vec<String>, DebateError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    pub async fn get(&self, name: &str) -> Result<Personality, DebateError> {
        self.store
            .load(name)
            .await?
            .ok_or_else(|| DebateError::personality_not_found(name))
    }

    /// Profiles for `names` in order; names no longer registered get a bare profile
    pub async fn resolve(&self, names: &[String]) -> Result<Vec<Personality>, DebateError> {
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            match self.store.load(name).await? {
                Some(p) => resolved.push(p),
                None => {
                    warn!(personality = %name, "Participant no longer registered, using bare profile");
                    resolved.push(Personality::bare(name.clone()));
                }
            }
        }
        Ok(resolved)
    }

    pub async fn record_result(
        &self,
        name: &str,
        result: DebateResult,
    ) -> Result<Personality, DebateError> {
        let (updated, ()) = self
            .store
            .update::<_, RuleViolation, _>(name, |p| {
                p.record_result(result);
                Ok(())
            })
            .await
            .map_err(lift(name))?;
        Ok(updated)
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, DebateError> {
        Ok(leaderboard(self.list_all().await?))
    }

    pub async fn stats(&self, name: &str) -> Result<PersonalityStats, DebateError> {
        Ok(self.get(name).await?.stats())
    }

    pub async fn top(&self, limit: usize, sort_by: RankBy) -> Result<Vec<Personality>, DebateError> {
        let mut all = self.list_all().await?;
        rank(&mut all, sort_by);
        all.truncate(limit);
        Ok(all)
    }

    pub async fn create(&self, personality: Personality) -> Result<Personality, DebateError> {
        personality.validate()?;
        match self.store.insert(&personality).await {
            Ok(()) => {
                info!(personality = %personality.name, "Personality created");
                Ok(personality)
            }
            Err(StorageError::AlreadyExists(_)) => Err(DebateError::Validation(format!(
                "personality '{}' already exists",
                personality.name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update(
        &self,
        name: &str,
        update: PersonalityUpdate,
    ) -> Result<Personality, DebateError> {
        let (updated, ()) = self
            .store
            .update(name, |p| p.apply_update(update.clone()))
            .await
            .map_err(lift(name))?;
        info!(personality = %name, "Personality updated");
        Ok(updated)
    }

    pub async fn delete(&self, name: &str) -> Result<(), DebateError> {
        if !self.store.delete(name).await? {
            return Err(DebateError::personality_not_found(name));
        }
        info!(personality = %name, "Personality deleted");
        Ok(())
    }

    /// Zero the statistics of one personality, or of all when `name` is `None`.
    ///
    /// Returns how many were reset.
    pub async fn reset_stats(&self, name: Option<&str>) -> Result<usize, DebateError> {
        let names = match name {
            Some(name) => vec![name.to_string()],
            None => self.store.names().await?,
        };
        for name in &names {
            self.store
                .update::<_, RuleViolation, _>(name, |p| {
                    p.reset_stats();
                    Ok(())
                })
                .await
                .map_err(lift(name))?;
        }
        info!(count = names.len(), "Personality statistics reset");
        Ok(names.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_persist::MemoryBackend;

    async fn seeded() -> PersonalityRegistry {
        let registry = PersonalityRegistry::new(Arc::new(MemoryBackend::new()), 16);
        registry.seed_defaults().await.unwrap();
        registry
    }

    fn result(won: bool, votes: u64, arguments: u64) -> DebateResult {
        DebateResult {
            won,
            votes_received: votes,
            arguments_contributed: arguments,
        }
    }

    #[tokio::test]
    async fn test_roster_and_resolve() {
        let registry = seeded().await;
        let roster = registry.debate_roster().await.unwrap();
        assert_eq!(roster.len(), 6);

        let resolved = registry
            .resolve(&["The Scientist".to_string(), "The Ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(resolved[0].debate_style, registry.get("The Scientist").await.unwrap().debate_style);
        assert_eq!(resolved[1].name, "The Ghost");
        assert!(resolved[1].personality_traits.is_empty());
    }

    #[tokio::test]
    async fn test_record_result_and_rankings() {
        let registry = seeded().await;
        registry.record_result("The Scientist", result(true, 4, 3)).await.unwrap();
        registry.record_result("The Historian", result(false, 1, 3)).await.unwrap();
        registry.record_result("The Historian", result(true, 0, 3)).await.unwrap();

        let board = registry.leaderboard().await.unwrap();
        assert_eq!(board[0].name, "The Historian");
        assert_eq!(board[0].win_rate, 50.0);
        assert_eq!(board[1].name, "The Scientist");

        let stats = registry.stats("The Scientist").await.unwrap();
        assert_eq!(stats.average_votes, 1.33);
        assert_eq!(stats.arguments_per_debate, 3.0);

        let top = registry.top(1, RankBy::AverageVotes).await.unwrap();
        assert_eq!(top[0].name, "The Scientist");

        assert!(matches!(
            registry.record_result("Nobody", result(true, 0, 0)).await,
            Err(DebateError::NotFound { kind: "personality", .. })
        ));
    }

    #[tokio::test]
    async fn test_admin_operations() {
        let registry = seeded().await;
        let mut newcomer = registry.get("The Scientist").await.unwrap();
        newcomer.name = "The Economist".into();
        registry.create(newcomer.clone()).await.unwrap();
        assert!(matches!(
            registry.create(newcomer).await,
            Err(DebateError::Validation(ref m)) if m.contains("already exists")
        ));

        let invalid = Personality::bare("X");
        assert!(matches!(registry.create(invalid).await, Err(DebateError::Validation(_))));

        let updated = registry
            .update(
                "The Economist",
                PersonalityUpdate {
                    debate_style: Some("Cost-benefit".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.debate_style, "Cost-benefit");

        let rejected = registry
            .update(
                "The Economist",
                PersonalityUpdate {
                    description: Some("short".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(rejected, Err(DebateError::Validation(_))));

        registry.delete("The Economist").await.unwrap();
        assert!(matches!(
            registry.delete("The Economist").await,
            Err(DebateError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let registry = seeded().await;
        registry.record_result("The Advocate", result(true, 2, 3)).await.unwrap();
        registry.record_result("The Pragmatist", result(true, 2, 3)).await.unwrap();

        assert_eq!(registry.reset_stats(Some("The Advocate")).await.unwrap(), 1);
        assert_eq!(registry.get("The Advocate").await.unwrap().wins, 0);
        assert_eq!(registry.get("The Pragmatist").await.unwrap().wins, 1);

        assert_eq!(registry.reset_stats(None).await.unwrap(), 6);
        assert_eq!(registry.get("The Pragmatist").await.unwrap().total_debates, 0);
    }
}
