//! Local key-value storage.
//!
//! Small JSON blobs (feedback log, notification preferences, alert history)
//! keyed by name. The SQLite store is what the app ships with; the in-memory
//! store backs tests and hosts that bring their own persistence.

use crate::error::AppError;
use crate::fs_manager::DataPaths;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Executor;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const FEEDBACK_KEY: &str = "chat_feedback";
pub const NOTIFICATION_PREFERENCES_KEY: &str = "notification_preferences";
pub const ALERT_HISTORY_KEY: &str = "alert_history";

#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// The stored value, or `None` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
    /// Appends `entry` to the JSON array at `key` as one atomic step, keeping at
    /// most `cap` newest entries. Returns the new length.
    ///
    /// An unreadable value is moved to `"{key}.corrupt"` before a fresh array
    /// is started.
    async fn append(&self, key: &str, entry: Value, cap: Option<usize>) -> Result<usize, AppError>;
}

/// Key under which an unreadable array is kept aside.
pub fn corrupt_key(key: &str) -> String {
    format!("{}.corrupt", key)
}

struct Appended {
    value: String,
    len: usize,
    unreadable: Option<String>,
}

fn append_to_array(
    key: &str,
    existing: Option<String>,
    entry: Value,
    cap: Option<usize>,
) -> Result<Appended, AppError> {
    let (mut entries, unreadable) = match existing {
        None => (Vec::new(), None),
        Some(raw) => match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(entries) => (entries, None),
            Err(e) => {
                error!(
                    "Stored array '{}' is unreadable, moving it to '{}': {}",
                    key,
                    corrupt_key(key),
                    e
                );
                (Vec::new(), Some(raw))
            }
        },
    };

    entries.push(entry);
    if let Some(cap) = cap {
        if entries.len() > cap {
            let excess = entries.len() - cap;
            entries.drain(..excess);
        }
    }

    Ok(Appended {
        value: serde_json::to_string(&entries)?,
        len: entries.len(),
        unreadable,
    })
}

/// SQLite-backed store, one row per key.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    // Serializes read-modify-write appends across pool connections.
    append_lock: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the store under `paths`.
    pub async fn open(paths: &DataPaths) -> Result<Self, AppError> {
        paths.init()?;
        let db_url = format!("sqlite://{}", paths.db_file().to_string_lossy());
        info!("Initializing key-value store at: {}", db_url);

        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database. Single connection so every query sees the same data.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            append_lock: Arc::new(Mutex::new(())),
        })
    }
}

async fn upsert<'e, E>(executor: E, key: &str, value: &str) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now().timestamp())
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        upsert(&self.pool, key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append(&self, key: &str, entry: Value, cap: Option<usize>) -> Result<usize, AppError> {
        let _guard = self.append_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;
        let appended = append_to_array(key, existing.map(|(v,)| v), entry, cap)?;

        if let Some(raw) = &appended.unreadable {
            upsert(&mut *tx, &corrupt_key(key), raw).await?;
        }
        upsert(&mut *tx, key, &appended.value).await?;
        tx.commit().await?;

        Ok(appended.len)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn append(&self, key: &str, entry: Value, cap: Option<usize>) -> Result<usize, AppError> {
        let mut entries = self.entries.lock().await;
        let appended = append_to_array(key, entries.get(key).cloned(), entry, cap)?;
        if let Some(raw) = appended.unreadable {
            entries.insert(corrupt_key(key), raw);
        }
        entries.insert(key.to_string(), appended.value);
        Ok(appended.len)
    }
}

/// Reads and decodes `key`. Missing or undecodable blobs yield the default.
pub async fn load_json<T, S>(store: &S, key: &str) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Stored value for '{}' is unreadable, using defaults: {}", key, e);
            Ok(T::default())
        }
    }
}

pub async fn save_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), AppError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    store.set(key, &serde_json::to_string(value)?).await
}

/// Appends `entry` to the JSON array at `key`. See [`KeyValueStore::append`].
pub async fn append_json<T, S>(
    store: &S,
    key: &str,
    entry: T,
    cap: Option<usize>,
) -> Result<usize, AppError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    store.append(key, serde_json::to_value(entry)?, cap).await
}
