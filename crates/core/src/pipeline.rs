use crate::error::UpstreamError;
use crate::models::RetrievedChunk;
use crate::prompts;
use crate::traits::{ChatModel, Embedder, VectorStore};

pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Per-request answering pipeline: rewrite the question, retrieve matching
/// chunks, compose the context block, synthesize the answer. Strictly
/// ordered; the first failing step propagates and nothing later runs.
///
/// Holds only read-only client handles, so one instance is shared across
/// concurrent requests.
pub struct QueryPipeline<E, C, S>
where
    E: Embedder,
    C: ChatModel,
    S: VectorStore,
{
    embedder: E,
    chat: C,
    store: S,
    top_k: usize,
    max_context_chars: Option<usize>,
}

impl<E, C, S> QueryPipeline<E, C, S>
where
    E: Embedder + Send + Sync,
    C: ChatModel + Send + Sync,
    S: VectorStore + Send + Sync,
{
    pub fn new(embedder: E, chat: C, store: S, top_k: usize) -> Self {
        Self {
            embedder,
            chat,
            store,
            top_k,
            max_context_chars: None,
        }
    }

    /// Caps the composed context block. Chunks are dropped from the tail of
    /// the ranking once the block would exceed the limit; the top-ranked
    /// chunk is always kept.
    pub fn with_max_context_chars(mut self, limit: Option<usize>) -> Self {
        self.max_context_chars = limit;
        self
    }

    pub async fn answer(&self, question: &str) -> Result<String, UpstreamError> {
        let standalone = self
            .chat
            .complete(&prompts::standalone_question_prompt(question))
            .await?;

        let query_embedding = self.embedder.embed(&standalone).await?;
        let hits = self
            .store
            .similarity_search(&query_embedding, self.top_k)
            .await?;

        let context = compose_context(&hits, self.max_context_chars);

        // The answer prompt carries the original question, not the rewrite.
        self.chat
            .complete(&prompts::answer_prompt(&context, question))
            .await
    }
}

/// Joins retrieved chunk texts in rank order with a blank-line separator.
/// Pure function of the retrieval result.
pub fn compose_context(hits: &[RetrievedChunk], max_chars: Option<usize>) -> String {
    let mut context = String::new();

    for (index, hit) in hits.iter().enumerate() {
        let mut grown_len = context.chars().count() + hit.content.chars().count();
        if index > 0 {
            grown_len += CONTEXT_SEPARATOR.len();
        }

        if let Some(limit) = max_chars {
            if index > 0 && grown_len > limit {
                break;
            }
        }

        if index > 0 {
            context.push_str(CONTEXT_SEPARATOR);
        }
        context.push_str(&hit.content);
    }

    context
}
