//! Per-record write serialization within one process
//!
//! Writers to the same key queue on an async mutex before their
//! read-modify-write, so in-process updates never lose a compare-and-swap to
//! each other. Compare-and-swap still guards against writers in other
//! processes sharing the same database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::OwnedMutexGuard;

/// Map size above which dead entries are swept on the next acquire
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`; released when the guard drops
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        self.slot(key).lock_owned().await
    }

    fn slot(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = slots.get(key).and_then(Weak::upgrade) {
            return existing;
        }
        if slots.len() >= SWEEP_THRESHOLD {
            slots.retain(|_, slot| slot.strong_count() > 0);
        }
        let fresh = Arc::new(tokio::sync::Mutex::new(()));
        slots.insert(key.to_string(), Arc::downgrade(&fresh));
        fresh
    }

    /// Keys with a live holder or waiter
    pub fn active(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.values().filter(|slot| slot.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();

        for _ in 0..64 {
            let locks = locks.clone();
            let inside = inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("debate:1").await;
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("personality:The Scientist").await;
        let _b = locks.lock("personality:The Historian").await;
        assert_eq!(locks.active(), 2);
    }
}
