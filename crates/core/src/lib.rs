pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod stores;
pub mod traits;

pub use chunking::{split_text, SplitterConfig, SEPARATORS};
pub use config::{AppConfig, DEFAULT_TOP_K};
pub use embeddings::{OpenAiEmbedder, DEFAULT_EMBEDDING_MODEL};
pub use error::{ConfigError, UpstreamError};
pub use ingest::ingest;
pub use llm::{OpenAiChat, DEFAULT_CHAT_MODEL};
pub use models::{RecordMetadata, RetrievedChunk, StoredRecord};
pub use pipeline::{compose_context, QueryPipeline, CONTEXT_SEPARATOR};
pub use stores::SupabaseStore;
pub use traits::{ChatModel, Embedder, VectorStore};
