//! HTTP handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::info;

use crate::ApiState;

#[derive(serde::Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ErrorBody {
            error: msg.to_string(),
        }),
    )
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// POST /api/warm
///
/// Discovery failure is the only error path and maps to 502, since the
/// fault is upstream.
pub async fn warm(State(state): State<ApiState>) -> impl IntoResponse {
    match state.warmer.run().await {
        Ok(summary) => {
            if let Ok(json) = serde_json::to_string(&summary) {
                info!(summary = %json, "warm summary");
            }
            Json(summary).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_GATEWAY).into_response(),
    }
}
