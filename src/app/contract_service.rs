//! The contract service.
//!
//! Translates typed calls into ledger operations:
//! 1.  Writing contract and evidence records as JSON under caller keys.
//! 2.  Running rich queries (plain and paginated) and wrapping each hit.
//! 3.  Reading the modification history of a key.
//!
//! The service holds no ledger state of its own. Every operation receives
//! the ledger it should act on, and every iterator it opens is released
//! before the operation returns.

use crate::app::error::{ContractError, ContractResult};
use crate::domain::model::{
    Borrower, ContractDraft, Evidence, HistoryResult, LedgerRecord, Lender, LoanContract, Party,
    QueryResult, QueryResultPage,
};
use crate::storage::ledger::{IteratorGuard, LedgerStub};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::debug;

/// Key of the seed contract written by [`ContractService::bootstrap`].
pub const SEED_CONTRACT_KEY: &str = "hmContract0";

/// Contract number of the seed contract.
pub const SEED_CONTRACT_NO: &str = "test";

/// Layout of history timestamps.
pub const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ContractService {
    history_offset: FixedOffset,
}

impl ContractService {
    /// `history_offset` is the fixed offset history timestamps are rendered in.
    pub fn new(history_offset: FixedOffset) -> Self {
        Self { history_offset }
    }

    /// Writes the seed contract. Repeated calls overwrite the same key.
    pub async fn bootstrap(&self, stub: &dyn LedgerStub) -> ContractResult<()> {
        let seed = LoanContract {
            contract_no: SEED_CONTRACT_NO.to_string(),
            ..Default::default()
        };
        self.put_record(stub, SEED_CONTRACT_KEY, &seed).await
    }

    /// Stores `evidence` under `key`, replacing whatever was there.
    pub async fn record_evidence(
        &self,
        stub: &dyn LedgerStub,
        key: &str,
        evidence: &Evidence,
    ) -> ContractResult<()> {
        self.put_record(stub, key, evidence).await
    }

    /// Decodes the embedded parties, then stores the assembled contract under
    /// `key`. Nothing is written when either party fails to decode.
    pub async fn record_contract(
        &self,
        stub: &dyn LedgerStub,
        key: &str,
        draft: ContractDraft,
    ) -> ContractResult<()> {
        let lender: Lender = parse_party(&draft.lender_json, "lender")?;
        let borrower: Borrower = parse_party(&draft.borrower_json, "borrower")?;

        let contract = LoanContract {
            id: draft.id,
            contract_no: draft.contract_no,
            amount: draft.amount,
            loan_date: draft.loan_date,
            business_type: draft.business_type,
            lender,
            borrower,
        };
        self.put_record(stub, key, &contract).await
    }

    /// Runs a rich query and returns every hit. The expression is passed to
    /// the ledger untouched.
    pub async fn query(
        &self,
        stub: &dyn LedgerStub,
        expression: &str,
    ) -> ContractResult<Vec<QueryResult>> {
        let mut iter = IteratorGuard::new(
            stub.get_query_result(expression)
                .await
                .map_err(ContractError::query)?,
        );

        let mut results = Vec::new();
        while iter.has_next() {
            let entry = iter.next().map_err(ContractError::query)?;
            results.push(QueryResult {
                key: entry.key,
                value: value_to_string(entry.value),
            });
        }
        debug!(hits = results.len(), "rich query completed");
        Ok(results)
    }

    /// Runs one page of a rich query. `page_size` must parse as a 32-bit
    /// integer; zero or less leaves the page uncapped. An empty `bookmark`
    /// starts from the beginning.
    pub async fn query_paged(
        &self,
        stub: &dyn LedgerStub,
        expression: &str,
        page_size: &str,
        bookmark: &str,
    ) -> ContractResult<QueryResultPage> {
        let page_size = parse_page_size(page_size)?;
        let (iterator, metadata) = stub
            .get_query_result_with_pagination(expression, page_size, bookmark)
            .await
            .map_err(ContractError::query)?;
        let mut iter = IteratorGuard::new(iterator);

        let mut results = Vec::new();
        while iter.has_next() {
            let entry = iter.next().map_err(ContractError::query)?;
            results.push(QueryResult {
                key: entry.key,
                value: value_to_string(entry.value),
            });
        }
        debug!(
            hits = results.len(),
            fetched = metadata.fetched_records_count,
            "paged rich query completed"
        );

        Ok(QueryResultPage {
            record_count: metadata.fetched_records_count,
            bookmark: metadata.bookmark,
            query_results: results,
        })
    }

    /// Returns the modification history of `key` in ledger order. Any
    /// failure discards the entries read so far.
    pub async fn history(
        &self,
        stub: &dyn LedgerStub,
        key: &str,
    ) -> ContractResult<Vec<HistoryResult>> {
        let mut iter = IteratorGuard::new(
            stub.get_history_for_key(key)
                .await
                .map_err(ContractError::query)?,
        );

        let mut results = Vec::new();
        while iter.has_next() {
            let modification = iter.next().map_err(ContractError::query)?;
            results.push(HistoryResult {
                tx_id: modification.tx_id,
                value: value_to_string(modification.value),
                is_delete: modification.is_delete.to_string(),
                timestamp: self.format_timestamp(modification.timestamp_seconds)?,
            });
        }
        debug!(key, entries = results.len(), "history read");
        Ok(results)
    }

    async fn put_record<R: LedgerRecord + Sync>(
        &self,
        stub: &dyn LedgerStub,
        key: &str,
        record: &R,
    ) -> ContractResult<()> {
        let bytes = record
            .to_ledger_bytes()
            .map_err(ContractError::persistence)?;
        stub.put_state(key, bytes)
            .await
            .map_err(ContractError::persistence)?;
        debug!(key, kind = R::KIND, "record written");
        Ok(())
    }

    fn format_timestamp(&self, seconds: i64) -> ContractResult<String> {
        let utc = DateTime::<Utc>::from_timestamp(seconds, 0)
            .ok_or_else(|| ContractError::query(format!("timestamp {seconds} is out of range")))?;
        Ok(utc
            .with_timezone(&self.history_offset)
            .format(HISTORY_TIME_FORMAT)
            .to_string())
    }
}

impl Default for ContractService {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

fn parse_party<T: Party>(raw: &str, field: &str) -> ContractResult<T> {
    if raw.is_empty() {
        return Ok(T::default());
    }
    T::from_party_json(raw).map_err(|e| ContractError::malformed_input(format!("{field}: {e}")))
}

fn parse_page_size(raw: &str) -> ContractResult<i32> {
    raw.parse::<i32>()
        .map_err(|e| ContractError::malformed_input(format!("page size '{raw}': {e}")))
}

fn value_to_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}
