use crate::domain::model::{
    Borrower, Evidence, HistoryResult, Lender, LoanContract, QueryResult, QueryResultPage,
};
use crate::transport::http::handlers::{health, invoke};
use crate::transport::http::types::{ApiResponse, AppState, InvokeRequest};
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(health::healthcheck_handler, invoke::invoke_handler),
    components(schemas(
        InvokeRequest,
        ApiResponse,
        LoanContract,
        Lender,
        Borrower,
        Evidence,
        QueryResult,
        QueryResultPage,
        HistoryResult
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/invoke", post(invoke::invoke_handler))
        .with_state(app_state)
}
