//! KnowledgeStore trait — abstract interface for the document store.
//!
//! Provides a clean abstraction over collection-oriented record storage for
//! ingestion and retrieval. The primary implementation is
//! `SqliteKnowledgeStore` in the `sqlite` module.

mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

pub use sqlite::SqliteKnowledgeStore;

/// One knowledge-base entry. Created once at ingestion, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, generated at creation.
    pub id: String,
    /// Free-text classification tag, optional filter key.
    pub category: String,
    pub question: String,
    pub answer: String,
    /// Question and answer merged under a fixed template.
    pub merged_text: String,
    /// Extracted terms, produced once at ingestion.
    pub keywords: Vec<String>,
    /// Embedding of `merged_text`. Elided (left empty) on read paths that
    /// do not need it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// Gate for retrieval; always true at creation.
    pub searchable: bool,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordHit {
    pub record: Record,
    /// Similarity score (higher = more similar).
    pub score: f32,
}

/// Abstract trait for the document store.
///
/// Implementations must preserve the score direction their distance
/// function implies: the query flow thresholds on "higher is closer".
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Enumerate the collections holding at least one record.
    async fn list_collections(&self) -> Result<Vec<String>, ApiError>;

    /// Persist a record. Fails on id collision; commits atomically.
    async fn create(&self, collection: &str, record: &Record) -> Result<(), ApiError>;

    /// Ranked nearest-neighbor search over searchable records, optionally
    /// restricted to an exact-match category, capped at `top_k`.
    async fn vector_search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        category: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<RecordHit>, ApiError>;

    /// Distinct non-empty category values in a collection.
    async fn distinct_categories(&self, collection: &str) -> Result<Vec<String>, ApiError>;

    /// All records of a collection for display, embeddings elided.
    async fn list_records(&self, collection: &str) -> Result<Vec<Record>, ApiError>;
}
