//! HTTP front-end: `GET /query?q=<question>`

use crate::error::{RagError, Result};
use crate::query::QueryEngine;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Routes with permissive CORS and request tracing
pub fn router(engine: Arc<QueryEngine>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/query", get(query_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { engine })
}

/// Bind `addr` and serve until the process is interrupted
pub async fn serve(engine: Arc<QueryEngine>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to bind {}", addr),
        })?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RagError::Io {
            source: e,
            context: "HTTP server stopped".to_string(),
        })?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Gita RAG API is running" }))
}

async fn query_handler(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> std::result::Result<Json<QueryResponse>, ApiError> {
    let question = match params.q {
        Some(q) if !q.trim().is_empty() => q,
        _ => return Err(bad_request("query parameter 'q' is required")),
    };

    let answer = state
        .engine
        .answer(&question)
        .await
        .map_err(internal_error)?;

    Ok(Json(QueryResponse {
        query: question,
        response: answer.answer,
    }))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn internal_error(err: RagError) -> ApiError {
    tracing::error!("Query failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::corpus::{load_faq_documents, DocumentUnit};
    use crate::embedding::EmbeddingProvider;
    use crate::ingest::Ingestor;
    use crate::llm::CompletionProvider;
    use crate::query::QuerySettings;
    use crate::test_support::{FailingCompletion, KeywordEmbedder, ScriptedCompletion};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app(dir: &std::path::Path, completion: Arc<dyn CompletionProvider>) -> Router {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(KeywordEmbedder::new(&["types of yoga", "arjuna"]));
        let ingestor = Ingestor::new(embedder.clone(), ChunkingConfig::default());
        let store = ingestor.open_store(dir).unwrap();

        let mut units = vec![DocumentUnit::new("Arjuna lays down his bow", "gita.pdf", 1)];
        units.extend(load_faq_documents());
        ingestor.ingest_into(&store, &units).unwrap();

        let engine =
            QueryEngine::new(Arc::new(store), embedder, completion, QuerySettings::default())
                .unwrap();
        router(Arc::new(engine))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_root() {
        let temp = TempDir::new().unwrap();
        let app = app(temp.path(), Arc::new(ScriptedCompletion::new("local", "x")));

        let (status, body) = get_json(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_query_faq_answer() {
        let temp = TempDir::new().unwrap();
        let app = app(temp.path(), Arc::new(ScriptedCompletion::new("global", "x")));

        let (status, body) = get_json(app, "/query?q=What%20are%20the%20types%20of%20yoga%3F").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], "What are the types of yoga?");
        assert!(body["response"]
            .as_str()
            .unwrap()
            .starts_with("Karma Yoga"));
    }

    #[tokio::test]
    async fn test_missing_query_is_bad_request() {
        let temp = TempDir::new().unwrap();
        let completion = Arc::new(ScriptedCompletion::new("local", "x"));

        let (status, body) = get_json(app(temp.path(), completion.clone()), "/query").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = get_json(app(temp.path(), completion.clone()), "/query?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(completion.classify_calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_internal_error() {
        let temp = TempDir::new().unwrap();
        let app = app(temp.path(), Arc::new(FailingCompletion));

        let (status, body) = get_json(app, "/query?q=Who%20is%20Arjuna").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
    }
}
