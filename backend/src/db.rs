//! SQLite-backed implementation of [`KeyValueStorage`].
//!
//! Documents live in a single `entities` table keyed by string. Secondary
//! indexes live in `index_entries`, ordered by an explicit position column.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use crate::error::Result;
use crate::storage::{KeyValueStorage, MutateFn};

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// DbConnection manages database operations
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
    key_locks: Arc<Mutex<HashMap<String, KeyLock>>>,
}

impl DbConnection {
    /// Create a new database connection, creating the database file if needed
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
            key_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Initialize a private in-memory database for tests
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let db_url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);
        let options = SqliteConnectOptions::from_str(&db_url)?;

        // A single long-lived connection keeps the shared in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
            key_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                key TEXT PRIMARY KEY,
                state TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS index_entries (
                index_name TEXT NOT NULL,
                item_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (index_name, item_id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Per-key async lock serializing mutations of the same key
    fn acquire_key_lock(&self, key: &str) -> KeyLock {
        let mut locks = self.key_locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Drop the lock entry once no other task is waiting on it
    fn release_key_lock(&self, key: &str, lock: KeyLock) {
        let mut locks = self.key_locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if locks.get(key).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(key);
        }
    }

    async fn read_transform_write(
        conn: &mut SqliteConnection,
        key: &str,
        f: MutateFn,
    ) -> Result<String> {
        let current: Option<String> =
            sqlx::query_scalar("SELECT state FROM entities WHERE key = ?")
                .bind(key)
                .fetch_optional(&mut *conn)
                .await?;

        let next = f(current)?;

        sqlx::query("INSERT OR REPLACE INTO entities (key, state) VALUES (?, ?)")
            .bind(key)
            .bind(&next)
            .execute(&mut *conn)
            .await?;

        Ok(next)
    }

    async fn mutate_in_transaction(&self, key: &str, f: MutateFn) -> Result<String> {
        let mut conn = self.pool.acquire().await?;

        // IMMEDIATE takes the write lock up front so concurrent writers on
        // other keys wait on busy_timeout instead of failing the upgrade
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let outcome = match Self::read_transform_write(&mut *conn, key, f).await {
            Ok(next) => sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map(|_| next)
                .map_err(Into::into),
            Err(e) => Err(e),
        };

        if outcome.is_err() {
            if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                error!("Rollback failed for key {}: {}", key, rollback_err);
            }
        }

        outcome
    }
}

#[async_trait]
impl KeyValueStorage for DbConnection {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT state FROM entities WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO entities (key, state) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entities WHERE key = ?")
            .bind(key)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mutate(&self, key: &str, f: MutateFn) -> Result<String> {
        let lock = self.acquire_key_lock(key);
        let outcome = {
            let _guard = lock.lock().await;
            debug!("Mutating key {}", key);
            self.mutate_in_transaction(key, f).await
        };
        self.release_key_lock(key, lock);
        outcome
    }

    async fn index_add(&self, index: &str, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO index_entries (index_name, item_id, position)
            VALUES (?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM index_entries WHERE index_name = ?))
            "#,
        )
        .bind(index)
        .bind(id)
        .bind(index)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn index_remove(&self, index: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM index_entries WHERE index_name = ? AND item_id = ?")
            .bind(index)
            .bind(id)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn index_list(&self, index: &str) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar(
            "SELECT item_id FROM index_entries WHERE index_name = ? ORDER BY position ASC",
        )
        .bind(index)
        .fetch_all(&*self.pool)
        .await?;
        Ok(ids)
    }
}
