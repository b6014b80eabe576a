use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe. Reports database connectivity.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "order-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "order-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness probe. Ready means both the database and the code store
/// answer.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.db.health_check().await.is_ok();
    let store_ok = state.registry.health_check().await.is_ok();

    if db_ok && store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
