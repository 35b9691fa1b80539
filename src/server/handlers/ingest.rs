use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: String,
}

/// Single-record ingestion from the form page.
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    Json(payload): Json<CreateRecordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .ingest
        .ingest(
            &collection,
            &payload.question,
            &payload.answer,
            &payload.category,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "record registered",
            "record": {
                "id": record.id,
                "category": record.category,
                "question": record.question,
                "answer": record.answer,
                "keywords": record.keywords,
            }
        })),
    ))
}

/// CSV batch ingestion; the body is the raw CSV text.
pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Path(collection): Path<String>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::BadRequest("empty CSV upload".to_string()));
    }

    let report = state.ingest.ingest_csv(&collection, &body).await?;
    Ok(Json(json!({
        "message": format!("{} of {} rows registered", report.succeeded, report.total),
        "report": report,
    })))
}
