use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/health - Liveness plus a store ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.notes.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "OK",
                    "message": "Server is running",
                    "timestamp": now,
                    "store": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

/// Fallback for unknown routes
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
