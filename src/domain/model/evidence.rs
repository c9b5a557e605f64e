use super::LedgerRecord;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Evidentiary document attached to a business record.
///
/// `business_id` conventionally points at a contract, but no integrity is
/// enforced between the two.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub content: String,
    pub data_type: String,
    pub file_name: String,
    pub evidence_type: String,
    #[serde(rename = "bizId")]
    pub business_id: String,
    #[serde(rename = "addInfo")]
    pub extra: String,
}

impl LedgerRecord for Evidence {
    const KIND: &'static str = "evidence";
}
