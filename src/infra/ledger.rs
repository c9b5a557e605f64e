use crate::infra::config::{AppConfig, LedgerBackend};
use crate::storage::ledger::{InMemoryLedger, LedgerStub, PostgresLedger};
use anyhow::Context;
use std::sync::Arc;

/// Opens the ledger back-end selected by the configuration. The PostgreSQL
/// back-end gets its tables created on the way.
pub async fn open_ledger(config: &AppConfig) -> anyhow::Result<Arc<dyn LedgerStub>> {
    match config.ledger_backend {
        LedgerBackend::Memory => Ok(Arc::new(InMemoryLedger::new())),
        LedgerBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let ledger = PostgresLedger::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to PostgreSQL")?;
            ledger
                .ensure_schema()
                .await
                .context("failed to create ledger tables")?;
            Ok(Arc::new(ledger))
        }
    }
}
