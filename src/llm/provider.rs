use async_trait::async_trait;
use serde_json::Value;

use super::types::{ChatRequest, ToolCall};
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "azure_openai")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest, deployment: &str) -> Result<String, ApiError>;

    /// chat completion with a declared tool set; returns the tool calls the
    /// model produced (possibly none)
    async fn chat_with_tools(
        &self,
        request: ChatRequest,
        tools: &[Value],
        deployment: &str,
    ) -> Result<Vec<ToolCall>, ApiError>;

    /// generate embeddings, one vector per input
    async fn embed(&self, inputs: &[String], deployment: &str)
        -> Result<Vec<Vec<f32>>, ApiError>;
}
