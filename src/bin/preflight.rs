use loan_ledger_chaincode::infra::config::{AppConfig, LedgerBackend};
use loan_ledger_chaincode::PostgresLedger;

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--create-tables]\n\
         \n\
         Reads the same env vars as the server:\n\
           LEDGER_BACKEND, DATABASE_URL, DATABASE_MAX_CONNECTIONS,\n\
           HISTORY_UTC_OFFSET, LEDGER_BIND_ADDR, LOG_LEVEL, LOG_FORMAT\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let create_tables = args.iter().any(|a| a == "--create-tables");

    // Force-read config (nice error messages if anything is off)
    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  LEDGER_BACKEND={:?}", config.ledger_backend);
    println!("  LEDGER_BIND_ADDR={}", config.bind_addr);
    println!("  HISTORY_UTC_OFFSET={}", config.history_offset);

    if config.ledger_backend == LedgerBackend::Memory {
        println!("  In-memory ledger selected; nothing to check.");
        println!("> Preflight OK.");
        return Ok(());
    }

    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let ledger = PostgresLedger::connect(url, config.database_max_connections)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
    println!("  PostgreSQL reachable.");

    if create_tables {
        ledger.ensure_schema().await?;
        println!("  Ledger tables ensured.");
    }

    match ledger.count_keys().await {
        Ok(n) => println!("  ledger_state holds {} key(s).", n),
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Ledger tables are not readable ({}). Re-run with --create-tables",
                e
            ))
        }
    }

    println!("> Preflight OK.");
    Ok(())
}
