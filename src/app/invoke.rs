//! Function-name dispatch: the invocation surface of the contract.
//!
//! A caller names a function and passes string arguments only. Names and
//! argument counts are checked here, before the service is reached.

use crate::app::contract_service::ContractService;
use crate::app::error::ContractError;
use crate::domain::model::{ContractDraft, Evidence};
use crate::storage::ledger::LedgerStub;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Bootstrap,
    RecordEvidence,
    RecordContract,
    Query,
    QueryPaged,
    History,
}

impl Function {
    pub const ALL: [Function; 6] = [
        Function::Bootstrap,
        Function::RecordEvidence,
        Function::RecordContract,
        Function::Query,
        Function::QueryPaged,
        Function::History,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Function::Bootstrap => "Bootstrap",
            Function::RecordEvidence => "RecordEvidence",
            Function::RecordContract => "RecordContract",
            Function::Query => "Query",
            Function::QueryPaged => "QueryPaged",
            Function::History => "History",
        }
    }

    /// Name the function is registered under on deployed ledgers; accepted
    /// as an alias.
    pub fn chaincode_name(self) -> &'static str {
        match self {
            Function::Bootstrap => "InitLedger",
            Function::RecordEvidence => "CreateHmEvidence",
            Function::RecordContract => "CreateHmContract",
            Function::Query => "QueryInfo",
            Function::QueryPaged => "QueryInfoByPage",
            Function::History => "QueryHistory",
        }
    }

    /// Number of string arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Function::Bootstrap => 0,
            Function::RecordEvidence => 7,
            Function::RecordContract => 8,
            Function::Query => 1,
            Function::QueryPaged => 3,
            Function::History => 1,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = InvokeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Function::ALL
            .into_iter()
            .find(|f| f.name() == s || f.chaincode_name() == s)
            .ok_or_else(|| InvokeError::UnknownFunction(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    Arity {
        function: Function,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl InvokeError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnknownFunction(_) | Self::Arity { .. } => 400,
            Self::Contract(e) => e.status_code(),
            Self::Encode(_) => 500,
        }
    }
}

/// Runs `function` with `args` against `stub`. Write operations answer with
/// JSON `null`; queries answer with their result encoded as JSON.
pub async fn invoke(
    service: &ContractService,
    stub: &dyn LedgerStub,
    function: &str,
    args: &[String],
) -> Result<JsonValue, InvokeError> {
    let function: Function = function.parse()?;
    if args.len() != function.arity() {
        return Err(InvokeError::Arity {
            function,
            expected: function.arity(),
            got: args.len(),
        });
    }
    tracing::debug!(%function, "invoking");

    let arg = |i: usize| args[i].clone();
    let response = match function {
        Function::Bootstrap => {
            service.bootstrap(stub).await?;
            JsonValue::Null
        }
        Function::RecordEvidence => {
            let evidence = Evidence {
                content: arg(1),
                data_type: arg(2),
                file_name: arg(3),
                evidence_type: arg(4),
                business_id: arg(5),
                extra: arg(6),
            };
            service.record_evidence(stub, &args[0], &evidence).await?;
            JsonValue::Null
        }
        Function::RecordContract => {
            let draft = ContractDraft {
                id: arg(1),
                contract_no: arg(2),
                amount: arg(3),
                loan_date: arg(4),
                business_type: arg(5),
                lender_json: arg(6),
                borrower_json: arg(7),
            };
            service.record_contract(stub, &args[0], draft).await?;
            JsonValue::Null
        }
        Function::Query => serde_json::to_value(service.query(stub, &args[0]).await?)?,
        Function::QueryPaged => serde_json::to_value(
            service
                .query_paged(stub, &args[0], &args[1], &args[2])
                .await?,
        )?,
        Function::History => serde_json::to_value(service.history(stub, &args[0]).await?)?,
    };
    Ok(response)
}
