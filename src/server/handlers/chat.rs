use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    pub session_id: String,
    pub message: String,
    /// Optional exact-match category filter; empty means no filter.
    #[serde(default)]
    pub category: Option<String>,
}

/// One query turn: embed, search, assemble, complete. The conversation is
/// only extended when the whole turn succeeds.
pub async fn chat_turn(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(payload): Json<ChatTurnRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.sessions.exists(&payload.session_id).await {
        return Err(ApiError::NotFound("session not found".to_string()));
    }

    let category = payload
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let outcome = state
        .query
        .run_turn(&collection, &payload.message, category)
        .await?;

    state
        .sessions
        .append_turn(&payload.session_id, &payload.message, &outcome.answer)
        .await;

    let results: Vec<Value> = outcome
        .results
        .iter()
        .map(|hit| {
            json!({
                "question": hit.record.question,
                "answer": hit.record.answer,
                "score": hit.score,
            })
        })
        .collect();

    Ok(Json(json!({
        "answer": outcome.answer,
        "results": results,
    })))
}
