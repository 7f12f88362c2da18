//! Debate documents, one record per debate with embedded arguments

use std::sync::Arc;

use agora_core::{Debate, DebateStatus};
use uuid::Uuid;

use crate::backend::{modify_record, StorageBackend, StorageError, StorageExt, UpdateError};
use crate::locks::KeyedLocks;
use crate::DEFAULT_CAS_ATTEMPTS;

/// One page of a debate listing
#[derive(Debug, Clone)]
pub struct DebatePage {
    pub debates: Vec<Debate>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

impl DebatePage {
    pub fn pages(&self) -> usize {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }
}

/// Debate store for persistence
#[derive(Debug)]
pub struct DebateStore<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
    prefix: String,
    attempts: u32,
    locks: Arc<KeyedLocks>,
}

impl<B: StorageBackend + ?Sized> Clone for DebateStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            prefix: self.prefix.clone(),
            attempts: self.attempts,
            locks: self.locks.clone(),
        }
    }
}

impl<B: StorageBackend + ?Sized> DebateStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            prefix: "debate:".to_string(),
            attempts: DEFAULT_CAS_ATTEMPTS,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Cap on compare-and-swap retries per update
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn key(&self, id: Uuid) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Persist a freshly created debate; ids never collide in practice
    pub async fn insert(&self, debate: &Debate) -> Result<(), StorageError> {
        if self.backend.insert_new(&self.key(debate.id), debate).await? {
            Ok(())
        } else {
            Err(StorageError::AlreadyExists(debate.id.to_string()))
        }
    }

    pub async fn load(&self, id: Uuid) -> Result<Option<Debate>, StorageError> {
        self.backend.get(&self.key(id)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, StorageError> {
        self.backend.delete(&self.key(id)).await
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, StorageError> {
        self.backend.exists(&self.key(id)).await
    }

    /// Apply `mutate` atomically; see [`modify_record`].
    ///
    /// Updates to one debate through this store (or its clones) run one at a time.
    pub async fn update<R, E, F>(&self, id: Uuid, mutate: F) -> Result<(Debate, R), UpdateError<E>>
    where
        R: Send,
        E: Send,
        F: FnMut(&mut Debate) -> Result<R, E> + Send,
    {
        let key = self.key(id);
        let _writer = self.locks.lock(&key).await;
        modify_record(self.backend.as_ref(), &key, self.attempts, mutate).await
    }

    pub async fn list_ids(&self) -> Result<Vec<Uuid>, StorageError> {
        let keys = self.backend.list_keys(&self.prefix).await?;
        Ok(keys
            .iter()
            .filter_map(|k| {
                k.strip_prefix(&self.prefix)
                    .and_then(|s| Uuid::parse_str(s).ok())
            })
            .collect())
    }

    /// Every debate, newest first
    pub async fn load_all(&self) -> Result<Vec<Debate>, StorageError> {
        let mut debates = Vec::new();
        for id in self.list_ids().await? {
            // Deleted between listing and loading
            if let Some(debate) = self.load(id).await? {
                debates.push(debate);
            }
        }
        debates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(debates)
    }

    /// Newest-first page, optionally filtered by status. Pages start at 1.
    pub async fn page(
        &self,
        page: usize,
        limit: usize,
        status: Option<DebateStatus>,
    ) -> Result<DebatePage, StorageError> {
        let page = page.max(1);
        let matching: Vec<Debate> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|d| status.map_or(true, |s| d.status == s))
            .collect();
        let total = matching.len();
        let debates = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Ok(DebatePage {
            debates,
            page,
            limit,
            total,
        })
    }

    pub async fn count(&self, status: Option<DebateStatus>) -> Result<usize, StorageError> {
        match status {
            None => Ok(self.list_ids().await?.len()),
            Some(s) => Ok(self
                .load_all()
                .await?
                .iter()
                .filter(|d| d.status == s)
                .count()),
        }
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<Debate>, StorageError> {
        let mut debates = self.load_all().await?;
        debates.truncate(limit);
        Ok(debates)
    }

    /// Case-insensitive substring match on the topic, newest first
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Debate>, StorageError> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|d| d.topic.to_lowercase().contains(&needle))
            .take(limit)
            .collect())
    }

    /// Arguments across all debates
    pub async fn total_arguments(&self) -> Result<usize, StorageError> {
        Ok(self
            .load_all()
            .await?
            .iter()
            .map(|d| d.arguments.len())
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use agora_core::{Argument, RuleViolation};

    fn debate(topic: &str) -> Debate {
        Debate::new(topic, None, vec!["A".into(), "B".into()], 3).unwrap()
    }

    fn store() -> DebateStore<MemoryBackend> {
        DebateStore::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn test_debate_store_crud() {
        let store = store();
        let d = debate("Is open source sustainable?");
        let id = d.id;

        store.insert(&d).await.unwrap();
        assert!(matches!(store.insert(&d).await, Err(StorageError::AlreadyExists(_))));
        assert!(store.exists(id).await.unwrap());
        assert_eq!(store.load(id).await.unwrap().unwrap(), d);
        assert_eq!(store.list_ids().await.unwrap(), vec![id]);

        assert!(store.delete(id).await.unwrap());
        assert!(store.load(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_applies_rule_and_persists() {
        let store = store();
        let d = debate("Is open source sustainable?");
        let id = d.id;
        store.insert(&d).await.unwrap();

        let round_one = vec![
            Argument::new("A", "Maintainers need funding to keep going.", 1),
            Argument::new("B", "Foundations already provide that support.", 1),
        ];
        let (updated, ()) = store
            .update(id, |d| d.begin(round_one.clone()))
            .await
            .unwrap();
        assert_eq!(updated.status, DebateStatus::InProgress);

        let again = store.update(id, |d| d.begin(round_one.clone())).await;
        assert!(matches!(
            again,
            Err(UpdateError::Rejected(RuleViolation::InvalidTransition { .. }))
        ));
        assert_eq!(store.load(id).await.unwrap().unwrap().arguments.len(), 2);
    }

    #[tokio::test]
    async fn test_queries() {
        let store = store();
        let mut judged = debate("Should Mars be colonised?");
        judged.status = DebateStatus::Judged;
        store.insert(&judged).await.unwrap();
        store.insert(&debate("Is MARS a good acronym?")).await.unwrap();
        store.insert(&debate("Are cats better than dogs?")).await.unwrap();

        assert_eq!(store.count(None).await.unwrap(), 3);
        assert_eq!(store.count(Some(DebateStatus::Judged)).await.unwrap(), 1);
        assert_eq!(store.search("mars", 10).await.unwrap().len(), 2);
        assert_eq!(store.recent(2).await.unwrap().len(), 2);

        let page = store.page(2, 2, None).await.unwrap();
        assert_eq!(page.debates.len(), 1);
        assert_eq!(page.total, 3);
        assert_eq!(page.pages(), 2);

        let created = store.page(1, 10, Some(DebateStatus::Created)).await.unwrap();
        assert_eq!(created.total, 2);
        assert_eq!(store.total_arguments().await.unwrap(), 0);
    }
}
