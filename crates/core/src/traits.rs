use crate::error::UpstreamError;
use crate::models::{RetrievedChunk, StoredRecord};
use async_trait::async_trait;

/// Produces a fixed-dimension vector for a chunk or query string.
#[async_trait]
pub trait Embedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError>;
}

/// Single-turn text completion against a hosted language model.
#[async_trait]
pub trait ChatModel {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// External store of (text, embedding) records with nearest-neighbor search.
#[async_trait]
pub trait VectorStore {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<(), UpstreamError>;

    async fn similarity_search(
        &self,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, UpstreamError>;
}
