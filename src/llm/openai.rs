//! OpenAI backend client
//!
//! Async HTTP client for the OpenAI chat-completions API with streaming
//! tool-call support.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::error::classify_status;
use crate::core::{Config, Message, Result, SceneChatError, ToolDefinition};
use crate::llm::sse::demux_response;
use crate::llm::traits::{EventStream, ModelStreamClient};
use crate::llm::wire::CompletionRequest;

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client from configuration. Fails when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .backends
            .openai_api_key
            .clone()
            .ok_or_else(|| SceneChatError::config("OPENAI_API_KEY not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.backends.timeout_secs))
            .build()
            .map_err(|e| SceneChatError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.backends.openai_base_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ModelStreamClient for OpenAiClient {
    async fn stream(
        &self,
        model: &str,
        messages: &[Message],
        tool: &ToolDefinition,
    ) -> Result<EventStream> {
        let request = CompletionRequest::new(model, messages, tool);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        Ok(demux_response(response))
    }

    fn name(&self) -> &str {
        "openai"
    }
}
