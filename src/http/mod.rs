//! HTTP surface: Axum router, request/response wire types, and the
//! TTL+LRU response cache.

pub mod cache;
pub mod routes;
pub mod schemas;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;

use crate::error::Error;
use crate::graph::Graph;
use crate::retrieval::RetrievalService;
use cache::TtlLruCache;
use schemas::ErrorResponse;

/// Shared state handed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<Graph>,
    pub retrieval: Arc<dyn RetrievalService>,
    pub cache: Arc<TtlLruCache>,
}

/// Builds the full Axum router over `state`.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/ingest", post(routes::ingest))
        .route("/api/index", delete(routes::delete_index))
        .route("/api/index/stats", get(routes::index_stats))
        .route("/api/documents", get(routes::list_documents))
        .route("/api/chat", post(routes::chat))
        .route("/api/chat/stream", post(routes::chat_stream))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Retrieval(crate::error::RetrievalError::DocumentNotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Retrieval(crate::error::RetrievalError::NotInitialized) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Retrieval(crate::error::RetrievalError::InvalidUpload { .. }) => StatusCode::BAD_REQUEST,
            Self::Llm(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) | Self::Internal { .. } | Self::JsonParse { .. } | Self::AgentProcessing { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Retrieval(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
