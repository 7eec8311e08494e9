use crate::error::UpstreamError;
use crate::traits::ChatModel;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-5-nano";

/// Client for the OpenAI chat completions endpoint. Each call is a single
/// user message; the raw assistant text comes back verbatim.
pub struct OpenAiChat {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiChat {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint("https://api.openai.com/v1", api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let details = response.text().await.unwrap_or_default();
            return Err(UpstreamError::BackendStatus {
                backend: "openai-chat".to_string(),
                status,
                details,
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|content| content.to_string())
            .ok_or_else(|| UpstreamError::BackendResponse {
                backend: "openai-chat".to_string(),
                details: "response has no choices[0].message.content".to_string(),
            })
    }
}
