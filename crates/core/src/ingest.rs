use crate::chunking::{split_text, SplitterConfig};
use crate::error::UpstreamError;
use crate::models::StoredRecord;
use crate::traits::{Embedder, VectorStore};

/// Splits `source_text`, embeds every chunk in order, and persists the
/// records as one batch. Any embedding failure aborts the run before the
/// store is touched, so the store's batch transaction is the only commit
/// point. Returns the number of records written.
pub async fn ingest(
    source_name: &str,
    source_text: &str,
    splitter: SplitterConfig,
    embedder: &impl Embedder,
    store: &impl VectorStore,
) -> Result<usize, UpstreamError> {
    splitter.validate()?;

    let chunks = split_text(source_text, splitter);
    if chunks.is_empty() {
        return Err(UpstreamError::InvalidArgument(format!(
            "source {source_name} produced no chunks"
        )));
    }

    let mut records = Vec::with_capacity(chunks.len());
    for (index, chunk) in chunks.into_iter().enumerate() {
        let embedding = embedder.embed(&chunk).await?;
        records.push(StoredRecord::new(source_name, index as u64, chunk, embedding));
    }

    store.upsert(&records).await?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RetrievedChunk;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::BackendResponse {
                    backend: "fake-embedder".to_string(),
                    details: "forced failure".to_string(),
                });
            }
            Ok(vec![text.len() as f32])
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        upserts: Mutex<Vec<Vec<StoredRecord>>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn upsert(&self, records: &[StoredRecord]) -> Result<(), UpstreamError> {
            self.upserts.lock().unwrap().push(records.to_vec());
            Ok(())
        }

        async fn similarity_search(
            &self,
            _embedding: &[f32],
            _top_k: usize,
        ) -> Result<Vec<RetrievedChunk>, UpstreamError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn every_chunk_becomes_one_record_in_one_batch() {
        let embedder = CountingEmbedder::default();
        let store = RecordingStore::default();
        let text = "first paragraph\n\nsecond paragraph\n\nthird paragraph";
        let splitter = SplitterConfig {
            max_chars: 20,
            overlap_chars: 4,
        };

        let written = ingest("doc.md", text, splitter, &embedder, &store)
            .await
            .unwrap();

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1, "expected a single batch upsert");
        assert_eq!(upserts[0].len(), written);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), written);
        assert_eq!(upserts[0][0].metadata.source, "doc.md");
        assert_eq!(upserts[0][0].metadata.chunk_index, 0);
    }

    #[tokio::test]
    async fn embedding_failure_aborts_before_the_store() {
        let embedder = CountingEmbedder {
            fail: true,
            ..Default::default()
        };
        let store = RecordingStore::default();

        let result = ingest(
            "doc.md",
            "some text",
            SplitterConfig::default(),
            &embedder,
            &store,
        )
        .await;

        assert!(result.is_err());
        assert!(store.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_source_is_rejected() {
        let embedder = CountingEmbedder::default();
        let store = RecordingStore::default();

        let result = ingest(
            "doc.md",
            "   \n\n  ",
            SplitterConfig::default(),
            &embedder,
            &store,
        )
        .await;

        assert!(matches!(result, Err(UpstreamError::InvalidArgument(_))));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }
}
