use crate::error::UpstreamError;
use crate::models::{RetrievedChunk, StoredRecord};
use crate::traits::VectorStore;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_TABLE: &str = "documents";
pub const DEFAULT_QUERY_NAME: &str = "match_documents";

/// REST client for a Supabase pgvector table. The table schema and the
/// similarity-search stored procedure are owned by the Supabase project,
/// not by this crate.
pub struct SupabaseStore {
    endpoint: String,
    api_key: String,
    table: String,
    query_name: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            query_name: DEFAULT_QUERY_NAME.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into();
        self
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<(), UpstreamError> {
        if records.is_empty() {
            return Ok(());
        }

        let rows = records
            .iter()
            .map(|record| {
                json!({
                    "content": record.content,
                    "embedding": record.embedding,
                    "metadata": {
                        "id": record.id,
                        "source": record.metadata.source,
                        "chunk_index": record.metadata.chunk_index,
                        "ingested_at": record.metadata.ingested_at,
                    },
                })
            })
            .collect::<Vec<_>>();

        // One batch insert so the store's transactional behavior applies to
        // the whole ingestion.
        let response = self
            .client
            .post(format!("{}/rest/v1/{}", self.endpoint, self.table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let details = response.text().await.unwrap_or_default();
            return Err(UpstreamError::BackendStatus {
                backend: "supabase".to_string(),
                status,
                details,
            });
        }

        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, UpstreamError> {
        let response = self
            .client
            .post(format!(
                "{}/rest/v1/rpc/{}",
                self.endpoint, self.query_name
            ))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query_embedding": embedding,
                "match_count": top_k,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().to_string();
            let details = response.text().await.unwrap_or_default();
            return Err(UpstreamError::BackendStatus {
                backend: "supabase".to_string(),
                status,
                details,
            });
        }

        let parsed: Value = response.json().await?;
        let rows = parsed
            .as_array()
            .ok_or_else(|| UpstreamError::BackendResponse {
                backend: "supabase".to_string(),
                details: "rpc response is not an array".to_string(),
            })?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let content = row
                .pointer("/content")
                .and_then(Value::as_str)
                .ok_or_else(|| UpstreamError::BackendResponse {
                    backend: "supabase".to_string(),
                    details: "row has no content field".to_string(),
                })?
                .to_string();
            let similarity = row
                .pointer("/similarity")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let metadata = row.pointer("/metadata").cloned().unwrap_or(Value::Null);

            hits.push(RetrievedChunk {
                content,
                similarity,
                metadata,
            });
        }

        Ok(hits)
    }
}
