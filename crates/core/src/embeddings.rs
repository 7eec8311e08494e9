use crate::error::UpstreamError;
use crate::traits::Embedder;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Client for the OpenAI embeddings endpoint.
pub struct OpenAiEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint("https://api.openai.com/v1", api_key)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let details = response.text().await.unwrap_or_default();
            return Err(UpstreamError::BackendStatus {
                backend: "openai-embeddings".to_string(),
                status,
                details,
            });
        }

        let parsed: Value = response.json().await?;
        let embedding = parsed
            .pointer("/data/0/embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| UpstreamError::BackendResponse {
                backend: "openai-embeddings".to_string(),
                details: "response has no data[0].embedding".to_string(),
            })?;

        embedding
            .iter()
            .map(|value| {
                value
                    .as_f64()
                    .map(|component| component as f32)
                    .ok_or_else(|| UpstreamError::BackendResponse {
                        backend: "openai-embeddings".to_string(),
                        details: "non-numeric embedding component".to_string(),
                    })
            })
            .collect()
    }
}
