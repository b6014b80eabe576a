use crate::startup::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// Capability gate for privileged routes. A valid `X-Admin-Api-Key`
/// header is the admin principal; everything else is rejected.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let api_key = headers
        .get("X-Admin-Api-Key")
        .and_then(|value| value.to_str().ok());

    match api_key {
        Some(key) if key == state.config.security.admin_api_key => next.run(request).await,
        _ => {
            tracing::warn!("Failed admin authentication attempt");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized: Invalid or missing admin API key" })),
            )
                .into_response()
        }
    }
}
