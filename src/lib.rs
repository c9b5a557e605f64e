pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::contract_service::ContractService;
pub use app::error::{ContractError, ContractResult};
pub use app::invoke::{invoke, Function, InvokeError};
pub use domain::model::{
    Borrower, ContractDraft, Evidence, HistoryResult, Lender, LedgerRecord, LoanContract,
    QueryResult, QueryResultPage,
};
pub use storage::ledger::{InMemoryLedger, LedgerError, LedgerStub, PostgresLedger};
