pub mod ledger;
pub mod query;
