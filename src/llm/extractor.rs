//! Structured keyword extraction.
//!
//! `KeywordExtractor` is the seam: the default implementation drives a chat
//! model through a declared tool schema, but a local strategy can be swapped
//! in without touching ingestion call sites.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest, ToolCall};
use crate::core::errors::ApiError;

const EXTRACTION_INSTRUCTION: &str =
    "Extract roughly 10 to 15 keywords from the content the user provides.";

#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Extract an ordered list of keywords describing `text`.
    async fn extract(&self, text: &str) -> Result<Vec<String>, ApiError>;
}

/// Extractor backed by a chat model tool call.
pub struct ToolCallKeywordExtractor {
    provider: Arc<dyn LlmProvider>,
    deployment: String,
    temperature: f64,
}

impl ToolCallKeywordExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, deployment: String, temperature: f64) -> Self {
        Self {
            provider,
            deployment,
            temperature,
        }
    }

    /// The declared tool schema: a `keywords` function taking a required
    /// array of strings.
    fn tool_schema() -> Value {
        json!({
            "type": "function",
            "function": {
                "name": "keywords",
                "description": "Analyzes the input and classifies it in detail.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "keywords": {
                            "type": "array",
                            "description": "Keywords related to the content of the input.",
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["keywords"]
                }
            }
        })
    }

    fn parse_keywords(calls: &[ToolCall]) -> Result<Vec<String>, ApiError> {
        let call = calls
            .iter()
            .find(|call| call.name == "keywords")
            .ok_or_else(|| {
                ApiError::Ingest("model returned no keywords tool call".to_string())
            })?;

        let arguments: Value = serde_json::from_str(&call.arguments).map_err(|e| {
            ApiError::Ingest(format!("malformed keywords tool-call arguments: {}", e))
        })?;

        let keywords = arguments["keywords"]
            .as_array()
            .ok_or_else(|| {
                ApiError::Ingest("keywords tool call carried no keywords array".to_string())
            })?
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect::<Vec<_>>();

        Ok(keywords)
    }
}

#[async_trait]
impl KeywordExtractor for ToolCallKeywordExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>, ApiError> {
        let request = ChatRequest::new(vec![
            ChatMessage {
                role: "system".to_string(),
                content: EXTRACTION_INSTRUCTION.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: text.to_string(),
            },
        ])
        .with_temperature(self.temperature);

        let calls = self
            .provider
            .chat_with_tools(request, &[Self::tool_schema()], &self.deployment)
            .await?;

        Self::parse_keywords(&calls)
    }
}
