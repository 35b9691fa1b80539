//! Azure OpenAI provider.
//!
//! Talks to an Azure-OpenAI-compatible endpoint using deployment-scoped
//! URLs and the `api-key` header. All transport and payload failures
//! surface as `ApiError::Provider`; callers decide whether to abort.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{ChatRequest, ToolCall};
use crate::core::config::ProviderSettings;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct AzureOpenAiProvider {
    endpoint: String,
    api_key: String,
    api_version: String,
    client: Client,
}

impl AzureOpenAiProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            api_version: settings.api_version.clone(),
            client: Client::new(),
        }
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment, operation, self.api_version
        )
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let res = self
            .client
            .post(url)
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(ApiError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Provider(format!(
                "azure openai error ({}): {}",
                status, text
            )));
        }

        res.json().await.map_err(ApiError::provider)
    }

    fn chat_body(request: &ChatRequest) -> Value {
        let mut body = json!({
            "messages": request.messages,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
            if let Some(s) = &request.stop {
                obj.insert("stop".to_string(), json!(s));
            }
        }

        body
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure_openai"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!(
            "{}/openai/models?api-version={}",
            self.endpoint, self.api_version
        );
        let res = self
            .client
            .get(&url)
            .header("api-key", &self.api_key)
            .send()
            .await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, deployment: &str) -> Result<String, ApiError> {
        let url = self.deployment_url(deployment, "chat/completions");
        let body = Self::chat_body(&request);

        let payload = self.post_json(&url, &body).await?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ApiError::Provider("chat response carried no message content".to_string())
            })?
            .to_string();

        Ok(content)
    }

    async fn chat_with_tools(
        &self,
        request: ChatRequest,
        tools: &[Value],
        deployment: &str,
    ) -> Result<Vec<ToolCall>, ApiError> {
        let url = self.deployment_url(deployment, "chat/completions");
        let mut body = Self::chat_body(&request);
        if let Some(obj) = body.as_object_mut() {
            obj.insert("tools".to_string(), json!(tools));
        }

        let payload = self.post_json(&url, &body).await?;

        let mut calls = Vec::new();
        if let Some(raw_calls) = payload["choices"][0]["message"]["tool_calls"].as_array() {
            for raw in raw_calls {
                let name = raw["function"]["name"].as_str().unwrap_or_default();
                let arguments = raw["function"]["arguments"].as_str().unwrap_or_default();
                if !name.is_empty() {
                    calls.push(ToolCall {
                        name: name.to_string(),
                        arguments: arguments.to_string(),
                    });
                }
            }
        }

        Ok(calls)
    }

    async fn embed(
        &self,
        inputs: &[String],
        deployment: &str,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() || inputs.iter().any(|input| input.trim().is_empty()) {
            return Err(ApiError::BadRequest(
                "embedding input must be non-empty".to_string(),
            ));
        }

        let url = self.deployment_url(deployment, "embeddings");
        let body = json!({ "input": inputs });

        let payload = self.post_json(&url, &body).await?;

        let data = payload["data"].as_array().ok_or_else(|| {
            ApiError::Provider("embedding response carried no data".to_string())
        })?;

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let vals = item["embedding"].as_array().ok_or_else(|| {
                ApiError::Provider("embedding response entry carried no vector".to_string())
            })?;
            let vec: Vec<f32> = vals
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            embeddings.push(vec);
        }

        Ok(embeddings)
    }
}
