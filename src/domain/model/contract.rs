use super::LedgerRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Loan contract metadata as stored on the ledger.
///
/// `amount` is kept as an opaque string; nothing in the service reads it
/// numerically.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanContract {
    pub id: String,
    pub contract_no: String,
    pub amount: String,
    pub loan_date: String,
    pub business_type: String,
    pub lender: Lender,
    pub borrower: Borrower,
}

impl LedgerRecord for LoanContract {
    const KIND: &'static str = "contract";
}

/// Lending party. Only ever embedded in a [`LoanContract`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Lender {
    pub name: String,
    pub legal_representative: String,
    #[serde(rename = "idcard")]
    pub id_card: String,
    pub phone: String,
    pub address: String,
}

/// Borrowing party. Only ever embedded in a [`LoanContract`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Borrower {
    pub name: String,
    pub gender: String,
    #[serde(rename = "idcard")]
    pub id_card: String,
    pub phone: String,
    pub address: String,
    pub age: String,
    pub nation: String,
}

/// A contract party decoded from caller-supplied JSON.
///
/// Decoding is lenient: `null` yields the zero-valued party, field names
/// match case-insensitively (an exact match wins), `null` field values leave
/// the field empty and unknown fields are ignored.
pub trait Party: DeserializeOwned + Default {
    /// Wire names of the party's fields.
    const FIELDS: &'static [&'static str];

    fn from_party_json(raw: &str) -> serde_json::Result<Self> {
        match serde_json::from_str(raw)? {
            Value::Null => Ok(Self::default()),
            Value::Object(map) => {
                let mut fields = Map::new();
                for (name, value) in map {
                    if value.is_null() {
                        continue;
                    }
                    let field = Self::FIELDS
                        .iter()
                        .find(|f| **f == name)
                        .or_else(|| Self::FIELDS.iter().find(|f| f.eq_ignore_ascii_case(&name)));
                    if let Some(field) = field {
                        fields.insert(field.to_string(), value);
                    }
                }
                serde_json::from_value(Value::Object(fields))
            }
            other => serde_json::from_value(other),
        }
    }
}

impl Party for Lender {
    const FIELDS: &'static [&'static str] =
        &["name", "legalRepresentative", "idcard", "phone", "address"];
}

impl Party for Borrower {
    const FIELDS: &'static [&'static str] =
        &["name", "gender", "idcard", "phone", "address", "age", "nation"];
}

/// Caller-supplied fields for a contract write, before the embedded parties
/// have been decoded.
///
/// `lender_json` and `borrower_json` are raw JSON documents; an empty string
/// stands for a zero-valued party.
#[derive(Debug, Clone, Default)]
pub struct ContractDraft {
    pub id: String,
    pub contract_no: String,
    pub amount: String,
    pub loan_date: String,
    pub business_type: String,
    pub lender_json: String,
    pub borrower_json: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_json_uses_wire_field_names() {
        let lender: Lender = serde_json::from_str(
            r#"{"name":"Bank","legalRepresentative":"Li","idcard":"110","address":"A"}"#,
        )
        .unwrap();
        assert_eq!(lender.legal_representative, "Li");
        assert_eq!(lender.id_card, "110");

        let encoded = serde_json::to_value(&lender).unwrap();
        assert!(encoded.get("idcard").is_some());
        assert!(encoded.get("legalRepresentative").is_some());
    }

    #[test]
    fn missing_party_fields_decode_to_empty_strings() {
        let borrower: Borrower =
            serde_json::from_str(r#"{"name":"Wang","extra":"ignored"}"#).unwrap();
        assert_eq!(borrower.name, "Wang");
        assert_eq!(borrower.age, "");
        assert_eq!(borrower.nation, "");
    }

    fn wire_names<T: Serialize + Default>() -> Vec<String> {
        let encoded = serde_json::to_value(T::default()).unwrap();
        let mut names: Vec<String> = encoded.as_object().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    #[test]
    fn party_field_lists_match_wire_names() {
        let mut lender: Vec<String> = Lender::FIELDS.iter().map(|f| f.to_string()).collect();
        lender.sort();
        assert_eq!(lender, wire_names::<Lender>());

        let mut borrower: Vec<String> = Borrower::FIELDS.iter().map(|f| f.to_string()).collect();
        borrower.sort();
        assert_eq!(borrower, wire_names::<Borrower>());
    }

    #[test]
    fn party_json_is_decoded_leniently() {
        assert_eq!(Lender::from_party_json("null").unwrap(), Lender::default());

        let lender = Lender::from_party_json(
            r#"{"Name":"Bank","LEGALREPRESENTATIVE":"Li","IdCard":"110","phone":null}"#,
        )
        .unwrap();
        assert_eq!(lender.name, "Bank");
        assert_eq!(lender.legal_representative, "Li");
        assert_eq!(lender.id_card, "110");
        assert_eq!(lender.phone, "");

        let borrower = Borrower::from_party_json(r#"{"name":"Wang","Nation":"Han"}"#).unwrap();
        assert_eq!(borrower.nation, "Han");

        assert!(Lender::from_party_json("[1]").is_err());
        assert!(Lender::from_party_json(r#"{"name":7}"#).is_err());
        assert!(Lender::from_party_json("{").is_err());
    }

    #[test]
    fn contract_round_trips_through_ledger_bytes() {
        let contract = LoanContract {
            contract_no: "CN001".to_string(),
            amount: "1000".to_string(),
            ..Default::default()
        };
        let bytes = contract.to_ledger_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"contractNo\":\"CN001\""));
        assert_eq!(LoanContract::from_ledger_bytes(&bytes).unwrap(), contract);
    }
}
