//! Personality records keyed by unique name

use std::sync::Arc;

use agora_core::Personality;
use tracing::info;

use crate::backend::{modify_record, StorageBackend, StorageError, StorageExt, UpdateError};
use crate::locks::KeyedLocks;
use crate::DEFAULT_CAS_ATTEMPTS;

#[derive(Debug)]
pub struct PersonalityStore<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
    prefix: String,
    attempts: u32,
    locks: Arc<KeyedLocks>,
}

impl<B: StorageBackend + ?Sized> Clone for PersonalityStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            prefix: self.prefix.clone(),
            attempts: self.attempts,
            locks: self.locks.clone(),
        }
    }
}

impl<B: StorageBackend + ?Sized> PersonalityStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            prefix: "personality:".to_string(),
            attempts: DEFAULT_CAS_ATTEMPTS,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Add a new personality; an existing name is never overwritten
    pub async fn insert(&self, personality: &Personality) -> Result<(), StorageError> {
        if self
            .backend
            .insert_new(&self.key(&personality.name), personality)
            .await?
        {
            Ok(())
        } else {
            Err(StorageError::AlreadyExists(personality.name.clone()))
        }
    }

    pub async fn load(&self, name: &str) -> Result<Option<Personality>, StorageError> {
        self.backend.get(&self.key(name)).await
    }

    pub async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        self.backend.delete(&self.key(name)).await
    }

    pub async fn update<R, E, F>(
        &self,
        name: &str,
        mutate: F,
    ) -> Result<(Personality, R), UpdateError<E>>
    where
        R: Send,
        E: Send,
        F: FnMut(&mut Personality) -> Result<R, E> + Send,
    {
        let key = self.key(name);
        let _writer = self.locks.lock(&key).await;
        modify_record(self.backend.as_ref(), &key, self.attempts, mutate).await
    }

    pub async fn names(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.backend.list_keys(&self.prefix).await?;
        Ok(keys
            .iter()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }

    /// All personalities in registration order
    pub async fn load_all(&self) -> Result<Vec<Personality>, StorageError> {
        let mut all = Vec::new();
        for name in self.names().await? {
            if let Some(p) = self.load(&name).await? {
                all.push(p);
            }
        }
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(all)
    }

    pub async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.names().await?.len())
    }

    /// Insert `defaults` only when no personality exists yet. Returns how many were added.
    pub async fn seed_if_empty(&self, defaults: &[Personality]) -> Result<usize, StorageError> {
        if self.count().await? > 0 {
            return Ok(0);
        }
        let mut added = 0;
        for personality in defaults {
            // A concurrent seeder may have raced us; keep whatever is there
            if self
                .backend
                .insert_new(&self.key(&personality.name), personality)
                .await?
            {
                added += 1;
            }
        }
        info!(added, "Seeded default personalities");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use agora_core::{default_personalities, DebateResult};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = PersonalityStore::new(Arc::new(MemoryBackend::new()));
        assert_eq!(store.seed_if_empty(&default_personalities()).await.unwrap(), 6);
        assert_eq!(store.seed_if_empty(&default_personalities()).await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_seed_never_overwrites() {
        let store = PersonalityStore::new(Arc::new(MemoryBackend::new()));
        let mut custom = default_personalities().remove(0);
        custom.wins = 12;
        store.insert(&custom).await.unwrap();

        assert_eq!(store.seed_if_empty(&default_personalities()).await.unwrap(), 0);
        assert_eq!(store.load(&custom.name).await.unwrap().unwrap().wins, 12);
    }

    #[tokio::test]
    async fn test_insert_and_update() {
        let store = PersonalityStore::new(Arc::new(MemoryBackend::new()));
        let p = default_personalities().remove(2);
        store.insert(&p).await.unwrap();
        assert!(matches!(store.insert(&p).await, Err(StorageError::AlreadyExists(_))));

        let (updated, ()) = store
            .update::<_, StorageError, _>(&p.name, |p| {
                p.record_result(DebateResult {
                    won: true,
                    votes_received: 3,
                    arguments_contributed: 3,
                });
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(updated.wins, 1);
        assert_eq!(store.load(&p.name).await.unwrap().unwrap().average_votes, 1.0);

        assert!(store.delete(&p.name).await.unwrap());
        assert!(store.load_all().await.unwrap().is_empty());
    }
}
