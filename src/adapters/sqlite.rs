use async_trait::async_trait;
use std::collections::VecDeque;

use sqlx::{
    Row,
    sqlite::{SqlitePool, SqlitePoolOptions},
};

use crate::adapters::{KeyValue, LedgerStore, SCAN_PAGE_SIZE, ScanCursor};
use crate::error::Error;

/// SQLite ledger store
///
/// Schema:
/// ```sql
/// CREATE TABLE ledger_state (
///     key TEXT PRIMARY KEY,
///     value BLOB NOT NULL
/// );
/// ```
///
/// SQLite compares TEXT with the BINARY collation by default, which gives the
/// same byte-wise key order as the in-memory store.
pub struct SqliteAdapter {
    pub(crate) pool: SqlitePool,
}

impl SqliteAdapter {
    /// Create a new SQLite adapter with a file-based database
    pub async fn new_file(path: &str) -> Result<Self, Error> {
        Self::connect(&format!("sqlite:{}?mode=rwc", path), 5).await
    }

    /// Create a new SQLite adapter with an in-memory database
    pub async fn new_memory() -> Result<Self, Error> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Connect using a full `sqlite:` URL
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger_state (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SqliteAdapter {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let row = sqlx::query("SELECT value FROM ledger_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        row.map(|row| row.try_get::<Vec<u8>, _>("value"))
            .transpose()
            .map_err(|e| Error::Storage(e.to_string()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO ledger_state (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        sqlx::query("DELETE FROM ledger_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(())
    }

    async fn scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor>, Error> {
        Ok(Box::new(SqliteCursor {
            pool: self.pool.clone(),
            start: start.to_string(),
            end: end.to_string(),
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }
}

/// Keyset-paginated cursor. Holds no connection between pages.
struct SqliteCursor {
    pool: SqlitePool,
    start: String,
    end: String,
    after: Option<String>,
    buffer: VecDeque<KeyValue>,
    exhausted: bool,
}

impl SqliteCursor {
    async fn fetch_page(&mut self) -> Result<(), Error> {
        let rows = match &self.after {
            Some(after) => sqlx::query(
                r#"
                SELECT key, value FROM ledger_state
                WHERE key > ? AND (? = '' OR key < ?)
                ORDER BY key ASC
                LIMIT ?
                "#,
            )
            .bind(after.as_str()),
            None => sqlx::query(
                r#"
                SELECT key, value FROM ledger_state
                WHERE key >= ? AND (? = '' OR key < ?)
                ORDER BY key ASC
                LIMIT ?
                "#,
            )
            .bind(self.start.as_str()),
        }
        .bind(self.end.as_str())
        .bind(self.end.as_str())
        .bind(SCAN_PAGE_SIZE)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        if (rows.len() as i64) < SCAN_PAGE_SIZE {
            self.exhausted = true;
        }

        for row in rows {
            let key: String = row.try_get("key").map_err(|e| Error::Storage(e.to_string()))?;
            let value: Vec<u8> = row
                .try_get("value")
                .map_err(|e| Error::Storage(e.to_string()))?;
            self.after = Some(key.clone());
            self.buffer.push_back(KeyValue { key, value });
        }

        Ok(())
    }
}

#[async_trait]
impl ScanCursor for SqliteCursor {
    async fn next(&mut self) -> Result<Option<KeyValue>, Error> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        // Pages are fetched eagerly, so there is no server-side state to end.
        drop(self);
        Ok(())
    }
}
