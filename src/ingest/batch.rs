//! CSV batch ingestion.
//!
//! Rows are processed strictly in file order. A failing row is reported
//! and skipped; the batch continues and the report carries per-row
//! outcomes. Token counts are informational only.

use serde::{Deserialize, Serialize};
use tiktoken_rs::cl100k_base;

use super::{merge_text, IngestPipeline};
use crate::core::errors::ApiError;

const EXPECTED_COLUMNS: [&str; 3] = ["question", "answer", "category"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    question: String,
    answer: String,
    category: String,
}

/// Outcome of one CSV row, 1-indexed in file order.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    /// cl100k_base token count of the merged text; absent when the row
    /// never parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows: Vec<RowOutcome>,
}

impl IngestPipeline {
    /// Ingest a CSV upload with the exact columns `question`, `answer`,
    /// `category`. One bad row does not block the rest.
    pub async fn ingest_csv(
        &self,
        collection: &str,
        csv_text: &str,
    ) -> Result<BatchReport, ApiError> {
        let tokenizer = cl100k_base().map_err(ApiError::internal)?;

        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ApiError::BadRequest(format!("unreadable CSV header: {}", e)))?
            .clone();
        let mut columns: Vec<&str> = headers.iter().collect();
        columns.sort_unstable();
        let mut expected = EXPECTED_COLUMNS;
        expected.sort_unstable();
        if columns != expected {
            return Err(ApiError::BadRequest(format!(
                "CSV must carry exactly the columns question, answer, category (got: {})",
                headers.iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut rows = Vec::new();
        let mut succeeded = 0;
        let mut failed = 0;

        for (index, parsed) in reader.deserialize::<CsvRow>().enumerate() {
            let row_number = index + 1;

            let row = match parsed {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("batch row {} did not parse: {}", row_number, e);
                    failed += 1;
                    rows.push(RowOutcome {
                        row: row_number,
                        record_id: None,
                        token_count: None,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let merged = merge_text(&row.question, &row.answer);
            let token_count = tokenizer.encode_with_special_tokens(&merged).len();

            match self
                .ingest(collection, &row.question, &row.answer, &row.category)
                .await
            {
                Ok(record) => {
                    tracing::info!(
                        "batch row {} ingested as {} ({} tokens)",
                        row_number,
                        record.id,
                        token_count
                    );
                    succeeded += 1;
                    rows.push(RowOutcome {
                        row: row_number,
                        record_id: Some(record.id),
                        token_count: Some(token_count),
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!("batch row {} failed: {}", row_number, e);
                    failed += 1;
                    rows.push(RowOutcome {
                        row: row_number,
                        record_id: None,
                        token_count: Some(token_count),
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(BatchReport {
            total: rows.len(),
            succeeded,
            failed,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::{pipeline, StubExtractor, StubProvider};
    use super::*;
    use crate::store::KnowledgeStore;

    fn ok_provider() -> Arc<StubProvider> {
        Arc::new(StubProvider {
            embedding: vec![1.0, 0.0],
            fail_embed: false,
        })
    }

    #[tokio::test]
    async fn batch_ingests_rows_in_order() {
        let (pipeline, store) =
            pipeline(ok_provider(), Arc::new(StubExtractor::new(&["kw"]))).await;

        let csv = "question,answer,category\n\
                   What is A?,A is first.,general\n\
                   What is B?,B is second.,billing\n";

        let report = pipeline.ingest_csv("faq", csv).await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 0);
        assert!(report.rows.iter().all(|row| row.error.is_none()));
        assert!(report.rows.iter().all(|row| row.token_count.unwrap() > 0));

        let records = store.list_records("faq").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question, "What is A?");
        assert_eq!(records[1].question, "What is B?");
    }

    #[tokio::test]
    async fn one_bad_row_does_not_block_the_rest() {
        let (pipeline, store) =
            pipeline(ok_provider(), Arc::new(StubExtractor::new(&["kw"]))).await;

        // row 2 has an empty answer and must fail validation
        let csv = "question,answer,category\n\
                   What is A?,A is first.,general\n\
                   What is B?,,billing\n\
                   What is C?,C is third.,general\n";

        let report = pipeline.ingest_csv("faq", csv).await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);

        assert_eq!(report.rows[1].row, 2);
        assert!(report.rows[1].record_id.is_none());
        assert!(report.rows[1].error.is_some());

        let records = store.list_records("faq").await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn wrong_columns_reject_the_whole_upload() {
        let (pipeline, store) =
            pipeline(ok_provider(), Arc::new(StubExtractor::new(&["kw"]))).await;

        let err = pipeline
            .ingest_csv("faq", "question,reply,category\nQ,A,c\n")
            .await;
        assert!(matches!(err, Err(ApiError::BadRequest(_))));
        assert!(store.list_records("faq").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failures_are_isolated_per_row() {
        let (pipeline, store) = pipeline(
            Arc::new(StubProvider {
                embedding: vec![1.0],
                fail_embed: true,
            }),
            Arc::new(StubExtractor::new(&["kw"])),
        )
        .await;

        let csv = "question,answer,category\nQ1,A1,c\nQ2,A2,c\n";
        let report = pipeline.ingest_csv("faq", csv).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 2);
        assert!(report.rows[0]
            .error
            .as_deref()
            .unwrap()
            .contains("quota exhausted"));
        assert!(store.list_records("faq").await.unwrap().is_empty());
    }
}
