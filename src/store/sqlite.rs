//! SQLite-backed knowledge store.
//!
//! In-process document store using SQLite for record storage and
//! brute-force cosine similarity for vector search. A `collection` column
//! stands in for named containers.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::{KnowledgeStore, Record, RecordHit};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteKnowledgeStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                merged_text TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '[]',
                embedding BLOB,
                searchable INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Scores mismatched or empty vectors as 0.0 rather than failing the
    /// whole search.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow, embedding: Vec<f32>) -> Record {
        let keywords_str: String = row.get("keywords");
        let keywords = serde_json::from_str::<Vec<String>>(&keywords_str).unwrap_or_default();
        let searchable: i64 = row.get("searchable");

        Record {
            id: row.get("id"),
            category: row.get("category"),
            question: row.get("question"),
            answer: row.get("answer"),
            merged_text: row.get("merged_text"),
            keywords,
            embedding,
            searchable: searchable != 0,
        }
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
        let rows = sqlx::query("SELECT DISTINCT collection FROM records ORDER BY collection")
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(rows.iter().map(|row| row.get("collection")).collect())
    }

    async fn create(&self, collection: &str, record: &Record) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(&record.embedding);
        let keywords_str =
            serde_json::to_string(&record.keywords).unwrap_or_else(|_| "[]".to_string());
        let created_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO records (id, collection, category, question, answer, merged_text, keywords, embedding, searchable, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&record.id)
        .bind(collection)
        .bind(&record.category)
        .bind(&record.question)
        .bind(&record.answer)
        .bind(&record.merged_text)
        .bind(&keywords_str)
        .bind(&blob)
        .bind(record.searchable as i64)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| ApiError::Ingest(format!("failed to write record: {}", e)))?;

        Ok(())
    }

    async fn vector_search(
        &self,
        collection: &str,
        query_embedding: &[f32],
        category: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<RecordHit>, ApiError> {
        let rows = if let Some(category) = category {
            sqlx::query(
                "SELECT id, collection, category, question, answer, merged_text, keywords, embedding, searchable
                 FROM records
                 WHERE collection = ?1 AND searchable = 1 AND category = ?2",
            )
            .bind(collection)
            .bind(category)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        } else {
            sqlx::query(
                "SELECT id, collection, category, question, answer, merged_text, keywords, embedding, searchable
                 FROM records
                 WHERE collection = ?1 AND searchable = 1",
            )
            .bind(collection)
            .fetch_all(&self.pool)
            .await
            .map_err(ApiError::internal)?
        };

        let mut scored: Vec<RecordHit> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(query_embedding, &stored);

                // embeddings are not returned to callers
                Some(RecordHit {
                    record: Self::row_to_record(row, Vec::new()),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k.max(1));

        Ok(scored)
    }

    async fn distinct_categories(&self, collection: &str) -> Result<Vec<String>, ApiError> {
        let rows = sqlx::query(
            "SELECT DISTINCT category FROM records
             WHERE collection = ?1 AND category != ''
             ORDER BY category",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(|row| row.get("category")).collect())
    }

    async fn list_records(&self, collection: &str) -> Result<Vec<Record>, ApiError> {
        let rows = sqlx::query(
            "SELECT id, collection, category, question, answer, merged_text, keywords, searchable
             FROM records
             WHERE collection = ?1
             ORDER BY created_at, rowid",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows
            .iter()
            .map(|row| Self::row_to_record(row, Vec::new()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> SqliteKnowledgeStore {
        let tmp = std::env::temp_dir().join(format!("qabase-test-{}.db", uuid::Uuid::new_v4()));
        SqliteKnowledgeStore::with_path(tmp).await.unwrap()
    }

    fn make_record(id: &str, category: &str, question: &str, embedding: Vec<f32>) -> Record {
        Record {
            id: id.to_string(),
            category: category.to_string(),
            question: question.to_string(),
            answer: format!("answer to {}", question),
            merged_text: format!("## question\n{}\n\n## answer\nanswer", question),
            keywords: vec!["kw".to_string()],
            embedding,
            searchable: true,
        }
    }

    #[tokio::test]
    async fn create_and_search() {
        let store = test_store().await;

        store
            .create("faq", &make_record("r1", "general", "What is X?", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let hits = store
            .vector_search("faq", &[1.0, 0.0, 0.0], None, 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, "r1");
        assert!(hits[0].score > 0.99);
        // embeddings are elided from search results
        assert!(hits[0].record.embedding.is_empty());
    }

    #[tokio::test]
    async fn id_collision_fails() {
        let store = test_store().await;

        let record = make_record("dup", "general", "Q", vec![1.0]);
        store.create("faq", &record).await.unwrap();

        let err = store.create("faq", &record).await;
        assert!(matches!(err, Err(ApiError::Ingest(_))));
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_and_caps_results() {
        let store = test_store().await;

        store
            .create("faq", &make_record("far", "general", "far", vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();
        store
            .create("faq", &make_record("near", "general", "near", vec![0.9, 0.1, 0.0]))
            .await
            .unwrap();
        store
            .create("faq", &make_record("mid", "general", "mid", vec![0.5, 0.5, 0.0]))
            .await
            .unwrap();

        let hits = store
            .vector_search("faq", &[1.0, 0.0, 0.0], None, 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.id, "near");
        assert_eq!(hits[1].record.id, "mid");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn category_filter_is_exact_match() {
        let store = test_store().await;

        store
            .create("faq", &make_record("a", "billing", "Q1", vec![1.0, 0.0]))
            .await
            .unwrap();
        store
            .create("faq", &make_record("b", "general", "Q2", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hits = store
            .vector_search("faq", &[1.0, 0.0], Some("billing"), 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.id, "a");

        let hits = store
            .vector_search("faq", &[1.0, 0.0], Some("bill"), 5)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn unsearchable_records_never_match() {
        let store = test_store().await;

        let mut record = make_record("hidden", "general", "Q", vec![1.0, 0.0]);
        record.searchable = false;
        store.create("faq", &record).await.unwrap();

        let hits = store
            .vector_search("faq", &[1.0, 0.0], None, 5)
            .await
            .unwrap();
        assert!(hits.is_empty());

        // still visible when browsing
        let records = store.list_records("faq").await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn dimension_mismatch_scores_zero() {
        let store = test_store().await;

        store
            .create("faq", &make_record("short", "general", "Q", vec![1.0, 0.0]))
            .await
            .unwrap();

        let hits = store
            .vector_search("faq", &[1.0, 0.0, 0.0], None, 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.0);
    }

    #[tokio::test]
    async fn collections_and_categories_are_distinct_and_ordered() {
        let store = test_store().await;

        store
            .create("faq", &make_record("1", "general", "Q1", vec![1.0]))
            .await
            .unwrap();
        store
            .create("faq", &make_record("2", "billing", "Q2", vec![1.0]))
            .await
            .unwrap();
        store
            .create("faq", &make_record("3", "billing", "Q3", vec![1.0]))
            .await
            .unwrap();
        store
            .create("docs", &make_record("4", "", "Q4", vec![1.0]))
            .await
            .unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["docs", "faq"]);
        assert_eq!(
            store.distinct_categories("faq").await.unwrap(),
            vec!["billing", "general"]
        );
        // empty categories are not offered as filters
        assert!(store.distinct_categories("docs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listed_records_keep_keywords_and_elide_embeddings() {
        let store = test_store().await;

        let mut record = make_record("r1", "general", "Q", vec![1.0, 2.0]);
        record.keywords = vec!["alpha".to_string(), "beta".to_string()];
        store.create("faq", &record).await.unwrap();

        let records = store.list_records("faq").await.unwrap();
        assert_eq!(records[0].keywords, vec!["alpha", "beta"]);
        assert!(records[0].embedding.is_empty());
    }
}
