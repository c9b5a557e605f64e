use thiserror::Error;

/// Failures surfaced by the contract service.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A write to world state failed.
    #[error("failed to put to world state: {0}")]
    Persistence(String),

    /// A read, query or iteration over world state failed.
    #[error("failed to read from world state: {0}")]
    Query(String),

    /// A caller-supplied argument could not be parsed.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl ContractError {
    pub fn persistence(msg: impl ToString) -> Self {
        Self::Persistence(msg.to_string())
    }

    pub fn query(msg: impl ToString) -> Self {
        Self::Query(msg.to_string())
    }

    pub fn malformed_input(msg: impl ToString) -> Self {
        Self::MalformedInput(msg.to_string())
    }

    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Persistence(_) => 500,
            Self::Query(_) => 500,
            Self::MalformedInput(_) => 400,
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;
