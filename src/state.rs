use std::sync::Arc;

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::history::SessionRegistry;
use crate::ingest::IngestPipeline;
use crate::llm::{AzureOpenAiProvider, KeywordExtractor, LlmProvider, ToolCallKeywordExtractor};
use crate::rag::QueryEngine;
use crate::store::{KnowledgeStore, SqliteKnowledgeStore};

/// Global application state shared across all routes.
///
/// Contains references to:
/// - Configuration and paths
/// - The document store
/// - The model provider and the pipelines built on it
/// - The in-memory session registry
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub store: Arc<dyn KnowledgeStore>,
    pub provider: Arc<dyn LlmProvider>,
    pub ingest: IngestPipeline,
    pub query: QueryEngine,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Setting up paths and loading settings
    /// 2. Opening the document store
    /// 3. Wiring the provider, extractor and pipelines
    pub async fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths)?;
        settings.validate()?;

        let store: Arc<dyn KnowledgeStore> =
            Arc::new(SqliteKnowledgeStore::new(paths.as_ref()).await?);

        let provider: Arc<dyn LlmProvider> =
            Arc::new(AzureOpenAiProvider::new(&settings.provider));

        let extractor: Arc<dyn KeywordExtractor> = Arc::new(ToolCallKeywordExtractor::new(
            provider.clone(),
            settings.provider.chat_deployment.clone(),
            settings.rag.extraction_temperature,
        ));

        let ingest = IngestPipeline::new(
            provider.clone(),
            extractor,
            store.clone(),
            &settings,
        );
        let query = QueryEngine::new(provider.clone(), store.clone(), &settings);

        Ok(Arc::new(Self {
            paths,
            settings,
            store,
            provider,
            ingest,
            query,
            sessions: SessionRegistry::new(),
        }))
    }
}
