//! Transient response shapes produced by query operations. None of these are
//! ever written to the ledger.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One world-state entry matched by a rich query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct QueryResult {
    pub key: String,
    /// Raw stored value, decoded as UTF-8.
    pub value: String,
}

/// One page of a paginated rich query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct QueryResultPage {
    /// Number of records the ledger reports as fetched for this page.
    /// Rendered as a decimal string on the wire.
    #[serde(rename = "size", with = "decimal_string")]
    #[schema(value_type = String)]
    pub record_count: i32,
    /// Opaque continuation token; pass it back to resume after this page.
    #[serde(rename = "bookMark")]
    pub bookmark: String,
    #[serde(rename = "queryResults")]
    pub query_results: Vec<QueryResult>,
}

/// One entry of a key's modification history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct HistoryResult {
    pub tx_id: String,
    pub value: String,
    /// `"true"` when the entry records a deletion.
    #[serde(rename = "is_del")]
    pub is_delete: String,
    /// Commit time as `YYYY-MM-DD HH:MM:SS`.
    #[serde(rename = "on_chain_time")]
    pub timestamp: String,
}

mod decimal_string {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<i32>().map_err(D::Error::custom)
    }
}
