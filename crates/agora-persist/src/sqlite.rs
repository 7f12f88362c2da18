//! SQLite backend implementation

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::backend::{StorageBackend, StorageError};

#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database URL (e.g. "sqlite:agora.db?mode=rwc" or "sqlite::memory:")
    pub url: String,
    pub max_connections: u32,
    /// WAL journal mode lets readers proceed during writes
    pub wal_mode: bool,
    pub busy_timeout_secs: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:agora.db?mode=rwc".to_string(),
            max_connections: 5,
            wal_mode: true,
            busy_timeout_secs: 30,
        }
    }
}

impl SqliteConfig {
    /// In-memory database; a single connection so every query sees the same data
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            wal_mode: false,
            busy_timeout_secs: 5,
        }
    }

    /// `DATABASE_URL`, or the default file next to the process
    pub fn from_env() -> Self {
        match std::env::var("DATABASE_URL") {
            Ok(url) if url.contains(":memory:") => Self {
                url,
                ..Self::memory()
            },
            Ok(url) => Self {
                url,
                ..Self::default()
            },
            Err(_) => Self::default(),
        }
    }
}

/// SQLite storage backend over a single `kv_store` table
#[derive(Debug)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub async fn new(url: &str) -> Result<Self, StorageError> {
        let config = if url.contains(":memory:") {
            SqliteConfig {
                url: url.to_string(),
                ..SqliteConfig::memory()
            }
        } else {
            SqliteConfig {
                url: url.to_string(),
                ..Default::default()
            }
        };
        Self::new_with_config(config).await
    }

    pub async fn new_with_config(config: SqliteConfig) -> Result<Self, StorageError> {
        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .pragma("busy_timeout", (config.busy_timeout_secs * 1000).to_string());
        if config.wal_mode {
            options = options.pragma("journal_mode", "WAL");
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        info!(url = %config.url, wal = config.wal_mode, "Connected to SQLite");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Internal(format!("Migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_text(value: &Value) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn query_err(e: sqlx::Error) -> StorageError {
    StorageError::Query(e.to_string())
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn is_healthy(&self) -> bool {
        !self.pool.is_closed() && sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn set_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let json = to_text(&value)?;
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO kv_store (key, value, created_at, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        use sqlx::Row;
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => {
                let text: String = row.try_get("value").map_err(query_err)?;
                let value = serde_json::from_str(&text)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err)?;
        Ok(row.is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        use sqlx::Row;
        // substr avoids LIKE treating '_' and '%' in the prefix as wildcards
        let rows = sqlx::query(
            "SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("key").map_err(query_err))
            .collect()
    }

    async fn insert_if_absent(&self, key: &str, value: Value) -> Result<bool, StorageError> {
        let json = to_text(&value)?;
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT OR IGNORE INTO kv_store (key, value, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(key)
        .bind(json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &Value,
        new: Value,
    ) -> Result<bool, StorageError> {
        // Stored text is always produced by to_text, so equal values compare as equal strings
        let expected = to_text(expected)?;
        let json = to_text(&new)?;
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            "UPDATE kv_store SET value = ?, updated_at = ? WHERE key = ? AND value = ?",
        )
        .bind(json)
        .bind(now)
        .bind(key)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(query_err)?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StorageExt;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[tokio::test]
    async fn test_sqlite_backend() {
        let backend = SqliteBackend::new("sqlite::memory:").await.unwrap();
        let data = Sample {
            name: "test_sql".to_string(),
            value: 99,
        };

        backend.set("sql:1", &data).await.unwrap();
        assert!(backend.exists("sql:1").await.unwrap());

        let retrieved: Option<Sample> = backend.get("sql:1").await.unwrap();
        assert_eq!(retrieved, Some(data));

        assert_eq!(backend.list_keys("sql:").await.unwrap(), vec!["sql:1"]);
        assert!(backend.list_keys("sq_:").await.unwrap().is_empty());

        assert!(backend.delete("sql:1").await.unwrap());
        assert!(!backend.exists("sql:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_conditional_writes() {
        let backend = SqliteBackend::new("sqlite::memory:").await.unwrap();
        let v1 = serde_json::json!({"status": "created", "score": 1.5});
        let v2 = serde_json::json!({"status": "in_progress", "score": 1.5});

        assert!(backend.insert_if_absent("d:1", v1.clone()).await.unwrap());
        assert!(!backend.insert_if_absent("d:1", v2.clone()).await.unwrap());

        let current = backend.get_value("d:1").await.unwrap().unwrap();
        assert!(backend.compare_and_swap("d:1", &current, v2.clone()).await.unwrap());
        assert!(!backend.compare_and_swap("d:1", &v1, v1.clone()).await.unwrap());
        assert_eq!(backend.get_value("d:1").await.unwrap(), Some(v2));
    }
}
