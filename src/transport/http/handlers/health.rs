use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (ledger reachable)", body = ApiResponse),
        (status = 503, description = "Service is unhealthy (ledger unreachable)", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.ledger.backend_name();

    match state.ledger.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(Some(serde_json::json!({
                "status": "ok",
                "ledger": backend,
            })))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                success: false,
                data: Some(serde_json::json!({ "status": "unhealthy", "ledger": backend })),
                error: Some(format!("Ledger ping failed: {}", e)),
            }),
        )
            .into_response(),
    }
}
