//! PostgreSQL ledger against a live database.
//! Skipped unless DATABASE_URL is set (a `.env` file is honoured).

use loan_ledger_chaincode::{ContractDraft, ContractService, LedgerStub, PostgresLedger};
use std::env;

async fn connect() -> Result<Option<PostgresLedger>, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL ledger test");
        return Ok(None);
    };
    let ledger = PostgresLedger::connect(&url, 2).await?;
    ledger.ensure_schema().await?;
    Ok(Some(ledger))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_postgres_ledger_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let Some(ledger) = connect().await? else {
        return Ok(());
    };
    ledger.health_check().await?;

    // Unique per run so repeated runs against one database stay independent.
    let run = format!("run-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let service = ContractService::default();

    for (i, no) in ["CN001", "CN002", "CN003"].into_iter().enumerate() {
        let draft = ContractDraft {
            id: format!("id{i}"),
            contract_no: no.to_string(),
            amount: "1000".to_string(),
            loan_date: "2024-01-01".to_string(),
            business_type: run.clone(),
            ..Default::default()
        };
        service.record_contract(&ledger, &format!("{run}-k{i}"), draft).await?;
    }
    service
        .record_contract(
            &ledger,
            &format!("{run}-k0"),
            ContractDraft {
                contract_no: "CN001-amended".to_string(),
                business_type: run.clone(),
                ..Default::default()
            },
        )
        .await?;

    // --- Direct read reflects the last write ---
    let stored = ledger.get_state(&format!("{run}-k0")).await?.expect("key exists");
    let stored: serde_json::Value = serde_json::from_slice(&stored)?;
    assert_eq!(stored["contractNo"], "CN001-amended");

    // --- Rich query scoped to this run ---
    let selector = format!(r#"{{"selector":{{"businessType":"{run}"}}}}"#);
    let hits = service.query(&ledger, &selector).await?;
    assert_eq!(hits.len(), 3);

    // --- Pagination walks the same keys ---
    let first = service.query_paged(&ledger, &selector, "2", "").await?;
    assert_eq!(first.record_count, 2);
    let second = service.query_paged(&ledger, &selector, "2", &first.bookmark).await?;
    assert_eq!(second.record_count, 1);
    let mut paged: Vec<String> = first
        .query_results
        .into_iter()
        .chain(second.query_results)
        .map(|r| r.key)
        .collect();
    paged.sort();
    assert_eq!(paged, vec![format!("{run}-k0"), format!("{run}-k1"), format!("{run}-k2")]);

    // --- History keeps both writes, oldest first ---
    let history = service.history(&ledger, &format!("{run}-k0")).await?;
    assert_eq!(history.len(), 2);
    assert!(history[0].value.contains("\"CN001\""));
    assert!(history[1].value.contains("CN001-amended"));
    assert_ne!(history[0].tx_id, history[1].tx_id);
    assert!(history.iter().all(|h| h.is_delete == "false"));

    assert!(ledger.count_keys().await? >= 3);
    Ok(())
}
