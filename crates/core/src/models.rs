use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One persisted (chunk text, embedding, metadata) triple; the unit of
/// retrieval in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
    pub chunk_index: u64,
    pub ingested_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(
        source: &str,
        chunk_index: u64,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: make_record_id(source, chunk_index, &content),
            content,
            embedding,
            metadata: RecordMetadata {
                source: source.to_string(),
                chunk_index,
                ingested_at: Utc::now(),
            },
        }
    }
}

fn make_record_id(source: &str, chunk_index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(chunk_index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One similarity-search hit, in rank order. Consumed once per request and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub similarity: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}
