use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

/// Liveness check: `{"status": "pong"}`
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "pong" }))
}

/// Root endpoint, kept for clients that poll `/`.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Todo App Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Readiness check: also verifies that storage answers.
///
/// Returns 503 when the storage backend is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "storage": "ok" })),
        ),
        Err(e) => {
            tracing::error!("Storage health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "storage": "unavailable" })),
            )
        }
    }
}
