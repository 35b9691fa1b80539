use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Liveness plus provider reachability.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let provider_ok = state.provider.health_check().await.unwrap_or(false);
    let collections = state.store.list_collections().await?;

    Ok(Json(json!({
        "status": "ok",
        "provider": {
            "name": state.provider.name(),
            "reachable": provider_ok,
        },
        "collections": collections.len(),
    })))
}
