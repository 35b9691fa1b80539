use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = state.sessions.create().await;
    Ok(Json(json!({"session_id": session_id})))
}

pub async fn get_session_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = state
        .sessions
        .messages(&session_id)
        .await
        .ok_or_else(|| ApiError::NotFound("session not found".to_string()))?;

    let payload: Vec<Value> = messages
        .into_iter()
        .map(|msg| json!({"role": msg.role, "content": msg.content}))
        .collect();
    Ok(Json(json!({"messages": payload})))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.sessions.remove(&session_id).await {
        return Err(ApiError::NotFound("session not found".to_string()));
    }
    Ok(Json(json!({"message": "session ended"})))
}
