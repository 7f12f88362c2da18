//! Storage backend trait, error types and the compare-and-swap update loop

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Debug;
use tracing::debug;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub(crate) fn serialization(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Document storage keyed by string (object safe)
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    fn name(&self) -> &str;

    async fn is_healthy(&self) -> bool;

    /// Unconditional upsert
    async fn set_value(&self, key: &str, value: Value) -> Result<(), StorageError>;

    async fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Store `value` only if `key` is unused. Returns whether it was stored.
    async fn insert_if_absent(&self, key: &str, value: Value) -> Result<bool, StorageError>;

    /// Replace the value at `key` only if it still equals `expected`.
    ///
    /// Returns `false` when the key is missing or holds something else.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Value,
        new: Value,
    ) -> Result<bool, StorageError>;
}

/// Typed access on top of the JSON backend
#[async_trait]
pub trait StorageExt {
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError>;
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;
    async fn insert_new<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<bool, StorageError>;
}

#[async_trait]
impl<S: StorageBackend + ?Sized> StorageExt for S {
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_value(value).map_err(StorageError::serialization)?;
        self.set_value(key, json).await
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_value(key).await? {
            Some(json) => Ok(Some(
                serde_json::from_value(json).map_err(StorageError::serialization)?,
            )),
            None => Ok(None),
        }
    }

    async fn insert_new<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<bool, StorageError> {
        let json = serde_json::to_value(value).map_err(StorageError::serialization)?;
        self.insert_if_absent(key, json).await
    }
}

/// Failure of a read-modify-write cycle
#[derive(Debug, thiserror::Error)]
pub enum UpdateError<E> {
    #[error("record not found: {0}")]
    NotFound(String),
    /// The mutation closure refused the change
    #[error("{0}")]
    Rejected(E),
    #[error("gave up after {0} conflicting concurrent updates")]
    Conflict(u32),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Read a record, apply `mutate`, and write it back with compare-and-swap.
///
/// On a lost race the closure is re-run against the fresh record, so its
/// precondition checks see whatever the winning writer committed. A rejection
/// from the closure ends the loop without writing anything.
pub async fn modify_record<B, T, R, E, F>(
    backend: &B,
    key: &str,
    attempts: u32,
    mut mutate: F,
) -> Result<(T, R), UpdateError<E>>
where
    B: StorageBackend + ?Sized,
    T: Serialize + DeserializeOwned + Send,
    R: Send,
    E: Send,
    F: FnMut(&mut T) -> Result<R, E> + Send,
{
    for attempt in 1..=attempts.max(1) {
        let Some(current) = backend.get_value(key).await? else {
            return Err(UpdateError::NotFound(key.to_string()));
        };
        let mut record: T =
            serde_json::from_value(current.clone()).map_err(StorageError::serialization)?;
        let outcome = mutate(&mut record).map_err(UpdateError::Rejected)?;
        let next = serde_json::to_value(&record).map_err(StorageError::serialization)?;

        if backend.compare_and_swap(key, &current, next).await? {
            return Ok((record, outcome));
        }
        debug!(key, attempt, "compare-and-swap lost, retrying on fresh state");
        tokio::task::yield_now().await;
    }
    Err(UpdateError::Conflict(attempts.max(1)))
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: tokio::sync::RwLock<std::collections::HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.data.read().await.contains_key(key))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        let mut keys: Vec<String> = data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn insert_if_absent(&self, key: &str, value: Value) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_string(), value);
        Ok(true)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Value,
        new: Value,
    ) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        match data.get_mut(key) {
            Some(slot) if *slot == *expected => {
                *slot = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Counter {
        name: String,
        value: u32,
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let backend = MemoryBackend::new();
        let data = Counter { name: "test".to_string(), value: 42 };

        backend.set("test:1", &data).await.unwrap();
        let retrieved: Option<Counter> = backend.get("test:1").await.unwrap();
        assert_eq!(retrieved, Some(data.clone()));

        assert!(backend.exists("test:1").await.unwrap());
        assert!(!backend.exists("test:2").await.unwrap());
        assert_eq!(backend.list_keys("test:").await.unwrap(), vec!["test:1"]);

        assert!(!backend.insert_new("test:1", &data).await.unwrap());
        assert!(backend.insert_new("test:2", &data).await.unwrap());

        assert!(backend.delete("test:1").await.unwrap());
        assert!(!backend.exists("test:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let backend = MemoryBackend::new();
        let v1 = serde_json::json!({"value": 1});
        let v2 = serde_json::json!({"value": 2});

        assert!(!backend.compare_and_swap("k", &v1, v2.clone()).await.unwrap());
        backend.set_value("k", v1.clone()).await.unwrap();
        assert!(backend.compare_and_swap("k", &v1, v2.clone()).await.unwrap());
        assert!(!backend.compare_and_swap("k", &v1, v1.clone()).await.unwrap());
        assert_eq!(backend.get_value("k").await.unwrap(), Some(v2));
    }

    #[tokio::test]
    async fn test_modify_record_concurrent_increments() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set("c", &Counter { name: "c".into(), value: 0 })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                modify_record::<_, Counter, (), String, _>(backend.as_ref(), "c", 64, |c| {
                    c.value += 1;
                    Ok(())
                })
                .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let counter: Counter = backend.get("c").await.unwrap().unwrap();
        assert_eq!(counter.value, 20);
    }

    #[tokio::test]
    async fn test_modify_record_rejection_writes_nothing() {
        let backend = MemoryBackend::new();
        backend
            .set("c", &Counter { name: "c".into(), value: 7 })
            .await
            .unwrap();

        let result = modify_record::<_, Counter, (), String, _>(&backend, "c", 4, |c| {
            c.value = 99;
            Err("nope".to_string())
        })
        .await;
        assert!(matches!(result, Err(UpdateError::Rejected(ref e)) if e == "nope"));

        let counter: Counter = backend.get("c").await.unwrap().unwrap();
        assert_eq!(counter.value, 7);

        let missing = modify_record::<_, Counter, (), String, _>(&backend, "nope", 4, |_| Ok(())).await;
        assert!(matches!(missing, Err(UpdateError::NotFound(_))));
    }
}
