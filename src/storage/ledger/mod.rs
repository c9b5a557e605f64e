//! Ledger access consumed by the contract service.
//!
//! The service never owns storage: every operation receives a `LedgerStub`
//! and works only through the primitives below. Two back-ends are provided,
//! an in-memory ledger and a PostgreSQL ledger, with identical semantics.

pub mod bookmark;
pub mod iterator;
pub mod memory;
pub mod paging;
pub mod postgres;

pub use iterator::{BufferedIterator, IteratorGuard};
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;

use crate::storage::query::InvalidQuery;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] InvalidQuery),
    #[error("invalid bookmark: {0}")]
    InvalidBookmark(String),
    #[error("iterator has no more results")]
    IteratorExhausted,
    #[error("iterator is closed")]
    IteratorClosed,
    #[error("ledger backend failure: {0}")]
    Backend(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// A world-state entry returned by a rich query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl From<(String, Vec<u8>)> for StateEntry {
    fn from((key, value): (String, Vec<u8>)) -> Self {
        Self { key, value }
    }
}

/// One committed modification of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub value: Vec<u8>,
    pub is_delete: bool,
    /// Commit time, seconds since the Unix epoch.
    pub timestamp_seconds: i64,
}

/// Pagination metadata returned alongside a page iterator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub fetched_records_count: i32,
    pub bookmark: String,
}

/// Cursor over ledger results. Must be closed once the caller is done;
/// wrap it in an [`IteratorGuard`] to get that on every exit path.
pub trait ResultsIterator<T>: Send {
    fn has_next(&self) -> bool;
    fn next(&mut self) -> LedgerResult<T>;
    fn close(&mut self) -> LedgerResult<()>;
}

pub type StateIterator = Box<dyn ResultsIterator<StateEntry>>;
pub type HistoryIterator = Box<dyn ResultsIterator<KeyModification>>;

/// State-access primitives provided by the hosting ledger.
#[async_trait]
pub trait LedgerStub: Send + Sync {
    /// Short name of the back-end, reported by the health endpoint.
    fn backend_name(&self) -> &'static str;

    async fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()>;

    async fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    async fn get_query_result(&self, query: &str) -> LedgerResult<StateIterator>;

    async fn get_query_result_with_pagination(
        &self,
        query: &str,
        page_size: i32,
        bookmark: &str,
    ) -> LedgerResult<(StateIterator, PageMetadata)>;

    async fn get_history_for_key(&self, key: &str) -> LedgerResult<HistoryIterator>;

    async fn health_check(&self) -> LedgerResult<()> {
        Ok(())
    }
}

pub(crate) fn validate_key(key: &str) -> LedgerResult<()> {
    if key.is_empty() {
        return Err(LedgerError::InvalidKey("key must not be empty".to_string()));
    }
    Ok(())
}
