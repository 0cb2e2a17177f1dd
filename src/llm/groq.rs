//! Groq backend client
//!
//! Groq exposes the same chat-completions wire protocol as OpenAI at a
//! different endpoint, so this client only differs in credentials, base URL,
//! and name.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::error::classify_status;
use crate::core::{Config, Message, Result, SceneChatError, ToolDefinition};
use crate::llm::sse::demux_response;
use crate::llm::traits::{EventStream, ModelStreamClient};
use crate::llm::wire::CompletionRequest;

/// Groq API client
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GroqClient {
    /// Create a client from configuration. Fails when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .backends
            .groq_api_key
            .clone()
            .ok_or_else(|| SceneChatError::config("GROQ_API_KEY not set"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.backends.timeout_secs))
            .build()
            .map_err(|e| SceneChatError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.backends.groq_base_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ModelStreamClient for GroqClient {
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
        "groq"
    }
}
