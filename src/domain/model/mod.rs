//! Domain model definitions for records stored on the ledger.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod contract;
pub mod evidence;
pub mod results;

pub use contract::{Borrower, ContractDraft, Lender, LoanContract, Party};
pub use evidence::Evidence;
pub use results::{HistoryResult, QueryResult, QueryResultPage};

/// Trait for any record persisted as a ledger value.
///
/// Ledger values are opaque bytes; every record crosses that boundary as
/// JSON. Implementations only name their kind, the encoding is shared.
pub trait LedgerRecord: Serialize + DeserializeOwned {
    /// Short human-readable kind, used in log lines and error messages.
    const KIND: &'static str;

    /// Serializes the record into the bytes written under its key.
    fn to_ledger_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a record from a stored ledger value.
    fn from_ledger_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
