use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let collections = state.store.list_collections().await?;
    Ok(Json(json!({"collections": collections})))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = state.store.distinct_categories(&collection).await?;
    Ok(Json(json!({"categories": categories})))
}

/// Records for the data-view page; embeddings stay server-side.
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.list_records(&collection).await?;
    let result: Vec<Value> = records
        .into_iter()
        .map(|record| {
            json!({
                "id": record.id,
                "category": record.category,
                "question": record.question,
                "answer": record.answer,
                "keywords": record.keywords,
            })
        })
        .collect();
    Ok(Json(json!({"records": result})))
}
