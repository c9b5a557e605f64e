use anyhow::Context;
use loan_ledger_chaincode::infra::config::AppConfig;
use loan_ledger_chaincode::infra::{ledger, telemetry};
use loan_ledger_chaincode::transport;
use loan_ledger_chaincode::ContractService;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;
    telemetry::init_tracing(&config.log_level, config.log_format);

    // --- Ledger Initialization ---
    tracing::info!(backend = ?config.ledger_backend, "opening ledger");
    let ledger = ledger::open_ledger(&config).await?;

    // --- Service Initialization ---
    let service = Arc::new(ContractService::new(config.history_offset));
    let app_state = transport::http::AppState {
        service,
        ledger: ledger.clone(),
    };

    // --- API Server Initialization ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    let swagger = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi());
    let app = transport::http::create_router(app_state)
        .merge(swagger)
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(
        addr = %config.bind_addr,
        ledger = ledger.backend_name(),
        "API server listening (Swagger UI at /swagger-ui)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown signal received");
        })
        .await?;

    tracing::info!("graceful shutdown complete");
    Ok(())
}
