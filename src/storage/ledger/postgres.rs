//! Persistent ledger implementation using PostgreSQL.
//!
//! World state lives in `ledger_state`; every committed write is appended to
//! `ledger_history` inside the same SQL transaction.

use super::paging::{run_paged_query, run_query};
use super::{
    validate_key, BufferedIterator, HistoryIterator, KeyModification, LedgerResult, LedgerStub,
    PageMetadata, StateIterator,
};
use crate::crypto::hashing::new_tx_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

const CREATOR: &str = "postgres-ledger";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS ledger_state (
        key TEXT PRIMARY KEY,
        value BYTEA NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ledger_history (
        seq BIGSERIAL PRIMARY KEY,
        key TEXT NOT NULL,
        tx_id TEXT NOT NULL,
        value BYTEA NOT NULL,
        is_delete BOOLEAN NOT NULL DEFAULT FALSE,
        committed_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS ledger_history_key_seq ON ledger_history (key, seq)",
];

/// A ledger that uses a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the ledger tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> LedgerResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn count_keys(&self) -> LedgerResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM ledger_state")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    async fn snapshot(&self) -> LedgerResult<Vec<(String, Vec<u8>)>> {
        let rows = sqlx::query("SELECT key, value FROM ledger_state ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push((row.try_get("key")?, row.try_get("value")?));
        }
        Ok(entries)
    }
}

#[async_trait]
impl LedgerStub for PostgresLedger {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        validate_key(key)?;
        let tx_id = new_tx_id(CREATOR);
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO ledger_state (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = $2",
        )
        .bind(key)
        .bind(&value)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "INSERT INTO ledger_history (key, tx_id, value, is_delete, committed_at)
             VALUES ($1, $2, $3, FALSE, $4)",
        )
        .bind(key)
        .bind(&tx_id)
        .bind(&value)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let row = sqlx::query("SELECT value FROM ledger_state WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(r) => Ok(Some(r.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn get_query_result(&self, query: &str) -> LedgerResult<StateIterator> {
        let hits = run_query(query, self.snapshot().await?)?;
        Ok(Box::new(BufferedIterator::new(hits)))
    }

    async fn get_query_result_with_pagination(
        &self,
        query: &str,
        page_size: i32,
        bookmark: &str,
    ) -> LedgerResult<(StateIterator, PageMetadata)> {
        let (page, metadata) = run_paged_query(query, self.snapshot().await?, page_size, bookmark)?;
        Ok((Box::new(BufferedIterator::new(page)), metadata))
    }

    async fn get_history_for_key(&self, key: &str) -> LedgerResult<HistoryIterator> {
        validate_key(key)?;
        let rows = sqlx::query(
            "SELECT tx_id, value, is_delete, committed_at
             FROM ledger_history WHERE key = $1 ORDER BY seq",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let committed_at: DateTime<Utc> = row.try_get("committed_at")?;
            entries.push(KeyModification {
                tx_id: row.try_get("tx_id")?,
                value: row.try_get("value")?,
                is_delete: row.try_get("is_delete")?,
                timestamp_seconds: committed_at.timestamp(),
            });
        }
        Ok(Box::new(BufferedIterator::new(entries)))
    }

    async fn health_check(&self) -> LedgerResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
