//! In-memory ledger: world state plus a per-key modification log.
//!
//! Each `put_state` behaves as its own committed transaction, so history
//! grows by exactly one entry per write.

use super::paging::{run_paged_query, run_query};
use super::{
    validate_key, BufferedIterator, HistoryIterator, KeyModification, LedgerResult, LedgerStub,
    PageMetadata, StateIterator,
};
use crate::crypto::hashing::new_tx_id;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

const CREATOR: &str = "memory-ledger";

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct LedgerState {
    world: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
}

pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    clock: Clock,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Uses `clock` to stamp every commit. Handy for deterministic history.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            clock: Arc::new(clock),
        }
    }

    /// Removes a key from world state and records the deletion in its history.
    pub async fn delete_state(&self, key: &str) -> LedgerResult<()> {
        validate_key(key)?;
        let mut state = self.state.write().await;
        state.world.remove(key);
        self.append_history(&mut state, key, Vec::new(), true);
        Ok(())
    }

    /// Number of live keys in world state.
    pub async fn len(&self) -> usize {
        self.state.read().await.world.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn append_history(&self, state: &mut LedgerState, key: &str, value: Vec<u8>, is_delete: bool) {
        let modification = KeyModification {
            tx_id: new_tx_id(CREATOR),
            value,
            is_delete,
            timestamp_seconds: (self.clock)().timestamp(),
        };
        state
            .history
            .entry(key.to_string())
            .or_default()
            .push(modification);
    }

    async fn snapshot(&self) -> Vec<(String, Vec<u8>)> {
        let state = self.state.read().await;
        state
            .world
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStub for InMemoryLedger {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        validate_key(key)?;
        let mut state = self.state.write().await;
        state.world.insert(key.to_string(), value.clone());
        self.append_history(&mut state, key, value, false);
        Ok(())
    }

    async fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.state.read().await.world.get(key).cloned())
    }

    async fn get_query_result(&self, query: &str) -> LedgerResult<StateIterator> {
        let hits = run_query(query, self.snapshot().await)?;
        Ok(Box::new(BufferedIterator::new(hits)))
    }

    async fn get_query_result_with_pagination(
        &self,
        query: &str,
        page_size: i32,
        bookmark: &str,
    ) -> LedgerResult<(StateIterator, PageMetadata)> {
        let (page, metadata) = run_paged_query(query, self.snapshot().await, page_size, bookmark)?;
        Ok((Box::new(BufferedIterator::new(page)), metadata))
    }

    async fn get_history_for_key(&self, key: &str) -> LedgerResult<HistoryIterator> {
        validate_key(key)?;
        let state = self.state.read().await;
        let entries = state.history.get(key).cloned().unwrap_or_default();
        Ok(Box::new(BufferedIterator::new(entries)))
    }
}
