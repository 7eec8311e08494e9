use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use docchat_core::{
    AppConfig, ChatModel, Embedder, OpenAiChat, OpenAiEmbedder, QueryPipeline, SplitterConfig,
    SupabaseStore, VectorStore,
};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docchat-server", version)]
struct Cli {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(long, default_value = "3333")]
    port: u16,

    /// Ingest this document file into the vector store before serving.
    #[arg(long)]
    ingest: Option<PathBuf>,
}

#[derive(Deserialize)]
struct PromptRequest {
    prompt: String,
}

async fn greeting() -> &'static str {
    "Hello"
}

/// All pipeline failures surface here as one opaque server error; the
/// detail goes to the log, not to the caller's status distinction.
async fn handle_prompt<E, C, S>(
    State(pipeline): State<Arc<QueryPipeline<E, C, S>>>,
    Json(request): Json<PromptRequest>,
) -> Response
where
    E: Embedder + Send + Sync,
    C: ChatModel + Send + Sync,
    S: VectorStore + Send + Sync,
{
    info!(prompt = %request.prompt, "prompt received");

    match pipeline.answer(&request.prompt).await {
        Ok(answer) => (StatusCode::OK, answer).into_response(),
        Err(upstream) => {
            error!(error = %upstream, "query pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": upstream.to_string() })),
            )
                .into_response()
        }
    }
}

fn build_router<E, C, S>(pipeline: QueryPipeline<E, C, S>) -> Router
where
    E: Embedder + Send + Sync + 'static,
    C: ChatModel + Send + Sync + 'static,
    S: VectorStore + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(greeting))
        .route("/prompt", post(handle_prompt::<E, C, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(pipeline))
}

async fn run_ingestion(config: &AppConfig, path: &PathBuf) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading source document {}", path.display()))?;
    let source_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document");

    let embedder = OpenAiEmbedder::new(&config.openai_api_key);
    let store = SupabaseStore::new(&config.supabase_url, &config.supabase_key);

    let written = docchat_core::ingest(
        source_name,
        &text,
        SplitterConfig::default(),
        &embedder,
        &store,
    )
    .await
    .with_context(|| format!("ingesting {}", path.display()))?;

    info!(source = %path.display(), chunks = written, "document ingested");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("resolving process configuration")?;

    if let Some(path) = &cli.ingest {
        run_ingestion(&config, path).await?;
    }

    let pipeline = QueryPipeline::new(
        OpenAiEmbedder::new(&config.openai_api_key),
        OpenAiChat::new(&config.openai_api_key),
        SupabaseStore::new(&config.supabase_url, &config.supabase_key),
        config.top_k,
    )
    .with_max_context_chars(config.max_context_chars);

    let app = build_router(pipeline);
    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(version = env!("CARGO_PKG_VERSION"), %addr, "docchat-server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use docchat_core::{RetrievedChunk, StoredRecord, UpstreamError};
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, UpstreamError> {
            Ok(vec![0.0])
        }
    }

    struct StubChat {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for StubChat {
        async fn complete(&self, _prompt: &str) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(UpstreamError::BackendResponse {
                    backend: "stub-chat".to_string(),
                    details: "forced failure".to_string(),
                });
            }
            Ok("stub answer".to_string())
        }
    }

    struct StubStore;

    #[async_trait]
    impl VectorStore for StubStore {
        async fn upsert(&self, _records: &[StoredRecord]) -> Result<(), UpstreamError> {
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

    fn test_router(chat_calls: Arc<AtomicUsize>, fail: bool) -> Router {
        let pipeline = QueryPipeline::new(
            StubEmbedder,
            StubChat {
                calls: chat_calls,
                fail,
            },
            StubStore,
            4,
        );
        build_router(pipeline)
    }

    fn prompt_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/prompt")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_returns_greeting() {
        let router = test_router(Arc::new(AtomicUsize::new(0)), false);
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Hello");
    }

    #[tokio::test]
    async fn prompt_returns_the_pipeline_answer() {
        let router = test_router(Arc::new(AtomicUsize::new(0)), false);
        let response = router
            .oneshot(prompt_request(r#"{"prompt":"who?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"stub answer");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_the_handler() {
        let chat_calls = Arc::new(AtomicUsize::new(0));
        let router = test_router(chat_calls.clone(), false);

        let response = router
            .oneshot(prompt_request(r#"{"question":"wrong field"}"#))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
        assert_eq!(chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pipeline_failure_becomes_a_500_error_payload() {
        let router = test_router(Arc::new(AtomicUsize::new(0)), true);
        let response = router
            .oneshot(prompt_request(r#"{"prompt":"who?"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(parsed.get("error").and_then(|e| e.as_str()).is_some());
    }
}
