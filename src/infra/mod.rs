pub mod config;
pub mod ledger;
pub mod telemetry;
