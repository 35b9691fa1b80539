//! Ingestion pipeline.
//!
//! Merges a question/answer pair under a fixed template, extracts keywords
//! through the structured extractor, embeds the merged text and persists
//! the record. The batch variant in `batch` repeats this per CSV row with
//! fail-soft semantics.

mod batch;

use std::sync::Arc;

use uuid::Uuid;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::{KeywordExtractor, LlmProvider};
use crate::store::{KnowledgeStore, Record};

pub use batch::{BatchReport, RowOutcome};

/// Fixed merge template; recomputed only at ingestion, never after.
pub fn merge_text(question: &str, answer: &str) -> String {
    format!("## question\n{}\n\n## answer\n{}", question, answer)
}

pub struct IngestPipeline {
    provider: Arc<dyn LlmProvider>,
    extractor: Arc<dyn KeywordExtractor>,
    store: Arc<dyn KnowledgeStore>,
    embedding_deployment: String,
}

impl IngestPipeline {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        extractor: Arc<dyn KeywordExtractor>,
        store: Arc<dyn KnowledgeStore>,
        settings: &Settings,
    ) -> Self {
        Self {
            provider,
            extractor,
            store,
            embedding_deployment: settings.provider.embedding_deployment.clone(),
        }
    }

    /// Ingest one record: merge, extract keywords, embed, persist.
    ///
    /// The write either commits whole or not at all; a committed record is
    /// final.
    pub async fn ingest(
        &self,
        collection: &str,
        question: &str,
        answer: &str,
        category: &str,
    ) -> Result<Record, ApiError> {
        if question.trim().is_empty() || answer.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "question and answer must not be empty".to_string(),
            ));
        }

        let merged = merge_text(question, answer);

        let keywords = self.extractor.extract(&merged).await?;

        let embeddings = self
            .provider
            .embed(&[merged.clone()], &self.embedding_deployment)
            .await?;
        let embedding = embeddings.into_iter().next().ok_or_else(|| {
            ApiError::Provider("embedding response was empty".to_string())
        })?;

        let record = Record {
            id: Uuid::new_v4().to_string(),
            category: category.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            merged_text: merged,
            keywords,
            embedding,
            searchable: true,
        };

        self.store.create(collection, &record).await?;
        tracing::info!("ingested record {} into {}", record.id, collection);

        Ok(record)
    }
}
