//! Query engine.
//!
//! One user turn: embed the question, run the filtered similarity search,
//! assemble the grounding context, issue the constrained completion. Each
//! step blocks the turn; a failure anywhere aborts it with no partial
//! answer.

use std::sync::Arc;

use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;
use crate::store::{KnowledgeStore, RecordHit};

use super::chat::GroundedChat;
use super::context::ContextAssembler;

/// Outcome of one query turn.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    /// Hits that cleared the threshold, in rank order, for display.
    pub results: Vec<RecordHit>,
}

pub struct QueryEngine {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn KnowledgeStore>,
    assembler: ContextAssembler,
    chat: GroundedChat,
    embedding_deployment: String,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn KnowledgeStore>,
        settings: &Settings,
    ) -> Self {
        let chat = GroundedChat::new(
            provider.clone(),
            settings.provider.chat_deployment.clone(),
            settings.rag.chat_temperature,
        );

        Self {
            provider,
            store,
            assembler: ContextAssembler::new(settings.rag.similarity_threshold),
            chat,
            embedding_deployment: settings.provider.embedding_deployment.clone(),
            top_k: settings.rag.top_k,
        }
    }

    pub async fn run_turn(
        &self,
        collection: &str,
        user_text: &str,
        category: Option<&str>,
    ) -> Result<QueryOutcome, ApiError> {
        if user_text.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "query text must not be empty".to_string(),
            ));
        }

        let vectors = self
            .provider
            .embed(&[user_text.to_string()], &self.embedding_deployment)
            .await?;
        let query_vector = vectors.into_iter().next().ok_or_else(|| {
            ApiError::Provider("embedding response was empty".to_string())
        })?;

        let hits = self
            .store
            .vector_search(collection, &query_vector, category, self.top_k)
            .await?;

        let assembly = self.assembler.assemble(&hits);
        tracing::debug!(
            "query turn: {} of {} hits cleared threshold {}",
            assembly.accepted.len(),
            hits.len(),
            self.assembler.threshold()
        );

        let answer = self
            .chat
            .complete(user_text, &assembly.grounding_text)
            .await?;

        Ok(QueryOutcome {
            answer,
            results: assembly.accepted,
        })
    }
}
