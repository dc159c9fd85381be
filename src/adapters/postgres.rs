use async_trait::async_trait;
use std::collections::VecDeque;

use sqlx::{
    PgPool, Row,
    postgres::PgPoolOptions,
};

use crate::adapters::{KeyValue, LedgerStore, SCAN_PAGE_SIZE, ScanCursor};
use crate::error::Error;

/// PostgreSQL ledger store
///
/// Schema:
/// ```sql
/// CREATE TABLE public.ledger_state (
///     key TEXT COLLATE "C" PRIMARY KEY,
///     value BYTEA NOT NULL
/// );
/// ```
///
/// The "C" collation keeps range scans in byte order regardless of the
/// database locale.
pub struct PostgresAdapter {
    pub(crate) pool: PgPool,
}

impl PostgresAdapter {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<(), Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS public.ledger_state (
                key TEXT COLLATE "C" PRIMARY KEY,
                value BYTEA NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl LedgerStore for PostgresAdapter {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let row = sqlx::query("SELECT value FROM public.ledger_state WHERE key = $1")
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
            INSERT INTO public.ledger_state (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
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
        sqlx::query("DELETE FROM public.ledger_state WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        Ok(())
    }

    async fn scan(&self, start: &str, end: &str) -> Result<Box<dyn ScanCursor>, Error> {
        Ok(Box::new(PostgresCursor {
            pool: self.pool.clone(),
            start: start.to_string(),
            end: end.to_string(),
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }
}

struct PostgresCursor {
    pool: PgPool,
    start: String,
    end: String,
    after: Option<String>,
    buffer: VecDeque<KeyValue>,
    exhausted: bool,
}

impl PostgresCursor {
    async fn fetch_page(&mut self) -> Result<(), Error> {
        // First page includes `start`, later pages resume strictly after the last key.
        let (lower, inclusive) = match &self.after {
            Some(after) => (after.as_str(), false),
            None => (self.start.as_str(), true),
        };

        let rows = sqlx::query(
            r#"
            SELECT key, value FROM public.ledger_state
            WHERE (key > $1 OR ($2 AND key = $1))
              AND ($3::text = '' OR key < $3)
            ORDER BY key ASC
            LIMIT $4
            "#,
        )
        .bind(lower)
        .bind(inclusive)
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
impl ScanCursor for PostgresCursor {
    async fn next(&mut self) -> Result<Option<KeyValue>, Error> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fetch_page().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn close(self: Box<Self>) -> Result<(), Error> {
        drop(self);
        Ok(())
    }
}
