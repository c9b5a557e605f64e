use crate::app::invoke::invoke;
use crate::transport::http::types::{json_422, ApiResponse, AppState, InvokeRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/invoke",
    request_body = InvokeRequest,
    responses(
        (status = 200, description = "Function executed", body = ApiResponse),
        (status = 400, description = "Unknown function, wrong argument count or malformed input", body = ApiResponse),
        (status = 422, description = "Request body is not valid JSON", body = ApiResponse),
        (status = 500, description = "Ledger write or query failed", body = ApiResponse)
    )
)]
pub async fn invoke_handler(
    State(state): State<AppState>,
    request: Result<Json<InvokeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(r) => r,
        Err(e) => {
            return json_422(e, r#"{"function": string, "args": [string]}"#).into_response()
        }
    };

    match invoke(
        &state.service,
        state.ledger.as_ref(),
        &request.function,
        &request.args,
    )
    .await
    {
        Ok(data) => {
            let data = (!data.is_null()).then_some(data);
            (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
        }
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                tracing::error!(function = %request.function, error = %e, "invoke failed");
            } else {
                tracing::debug!(function = %request.function, error = %e, "invoke rejected");
            }
            (status, Json(ApiResponse::failed(e.to_string()))).into_response()
        }
    }
}
