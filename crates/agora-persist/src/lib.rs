//! # Agora Persistence
//!
//! Document storage for debates and personalities.
//!
//! Supports:
//! - In-memory (for tests and the CLI)
//! - SQLite (for single-node deployments)
//!
//! Every backend offers an atomic compare-and-swap, which the typed stores use
//! to apply lifecycle transitions without lost updates. Within a process the
//! stores also queue writers per record, so concurrent votes and stat updates
//! never exhaust their retries against each other.

pub mod backend;
pub mod debate_store;
pub mod locks;
pub mod personality_store;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::{modify_record, MemoryBackend, StorageBackend, StorageError, StorageExt, UpdateError};
pub use debate_store::{DebatePage, DebateStore};
pub use locks::KeyedLocks;
pub use personality_store::PersonalityStore;
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteBackend, SqliteConfig};

/// Bounded retries for compare-and-swap loops
pub const DEFAULT_CAS_ATTEMPTS: u32 = 16;
