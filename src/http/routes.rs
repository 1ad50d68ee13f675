//! Axum handlers for the ingestion, query, and housekeeping endpoints.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::stream;
use tracing::instrument;

use crate::error::{Error, Result, RetrievalError};
use crate::graph::AgentState;

use super::schemas::{ChatRequest, DocumentSummary, IndexStats, IngestResponse, QueryResponse};
use super::AppState;

fn new_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.retrieval.health_check().await {
        (axum::http::StatusCode::OK, "ok")
    } else {
        (axum::http::StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }
}

/// `POST /api/ingest`. Accepts a single `multipart/form-data` file field and
/// stores its bytes to a scratch path before handing it to the retrieval
/// port for extraction and chunking.
#[instrument(skip(state, multipart))]
pub async fn ingest(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Retrieval(RetrievalError::InvalidUpload { reason: e.to_string() }))?
    else {
        return Err(Error::Retrieval(RetrievalError::InvalidUpload { reason: "no file field present".to_string() }));
    };

    let original_filename = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| Error::Retrieval(RetrievalError::InvalidUpload { reason: "missing filename".to_string() }))?;

    if !original_filename.to_lowercase().ends_with(".pdf") {
        return Err(Error::Retrieval(RetrievalError::InvalidUpload {
            reason: format!("'{original_filename}' is not a PDF"),
        }));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| Error::Retrieval(RetrievalError::InvalidUpload { reason: e.to_string() }))?;

    if bytes.is_empty() {
        return Err(Error::Retrieval(RetrievalError::InvalidUpload { reason: "empty upload".to_string() }));
    }

    let scratch_path = std::env::temp_dir().join(format!("rfp-ingest-{}.pdf", uuid::Uuid::new_v4()));
    tokio::fs::write(&scratch_path, &bytes)
        .await
        .map_err(|e| Error::Retrieval(RetrievalError::InvalidUpload { reason: e.to_string() }))?;

    let result = state.retrieval.ingest_document(&scratch_path, &original_filename).await;
    let _ = tokio::fs::remove_file(&scratch_path).await;

    let chunks_added = result?;
    Ok(Json(IngestResponse { source: original_filename, chunks_added }))
}

/// `DELETE /api/index`.
pub async fn delete_index(State(state): State<AppState>) -> Result<Json<bool>> {
    let cleared = state.retrieval.clear_index().await?;
    state.cache.clear();
    Ok(Json(cleared))
}

/// `GET /api/index/stats`.
pub async fn index_stats(State(state): State<AppState>) -> Result<Json<IndexStats>> {
    let stats = state.retrieval.get_stats().await?;
    let document_count = stats.get("document_count").and_then(serde_json::Value::as_u64).unwrap_or(0) as usize;
    let chunk_count = stats.get("chunk_count").and_then(serde_json::Value::as_u64).unwrap_or(0) as usize;
    Ok(Json(IndexStats { document_count, chunk_count }))
}

/// `GET /api/documents`.
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<DocumentSummary>>> {
    let docs = state.retrieval.get_indexed_documents().await?;
    Ok(Json(
        docs.into_iter().map(|d| DocumentSummary { source: d.name, chunk_count: d.chunks }).collect(),
    ))
}

/// `POST /api/chat`. Runs the full pipeline for `request.question`, serving
/// from the response cache when the normalized question was already seen.
#[instrument(skip(state, request))]
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<Json<QueryResponse>> {
    validate_question(&request.question)?;

    let cache_key = super::cache::TtlLruCache::key_for(&request.question);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json(cached));
    }

    let trace_id = new_trace_id();
    let initial = AgentState::new(trace_id, request.question);
    let result = state.graph.run(initial).await?;
    let response = QueryResponse::from_state(&result);

    state.cache.set(cache_key, response.clone());
    Ok(Json(response))
}

/// `POST /api/chat/stream`. Emits a `status` event while the pipeline runs,
/// then a single `result` event with the final answer, or an `error` event
/// if the pipeline fails.
#[instrument(skip(state, request))]
pub async fn chat_stream(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let events: Vec<Result<Event, Infallible>> = match validate_question(&request.question) {
        Err(e) => vec![Ok(Event::default().event("error").data(e.to_string()))],
        Ok(()) => {
            let cache_key = super::cache::TtlLruCache::key_for(&request.question);
            if let Some(cached) = state.cache.get(&cache_key) {
                let payload = serde_json::to_string(&cached).unwrap_or_default();
                vec![
                    Ok(Event::default().event("status").data("cached")),
                    Ok(Event::default().event("result").data(payload)),
                ]
            } else {
                let trace_id = new_trace_id();
                let initial = AgentState::new(trace_id, request.question);
                match state.graph.run(initial).await {
                    Ok(result) => {
                        let response = QueryResponse::from_state(&result);
                        state.cache.set(cache_key, response.clone());
                        let payload = serde_json::to_string(&response).unwrap_or_default();
                        vec![
                            Ok(Event::default().event("status").data("processing")),
                            Ok(Event::default().event("result").data(payload)),
                        ]
                    }
                    Err(e) => vec![
                        Ok(Event::default().event("status").data("processing")),
                        Ok(Event::default().event("error").data(e.to_string())),
                    ],
                }
            }
        }
    };

    Sse::new(stream::iter(events))
        .keep_alive(axum::response::sse::KeepAlive::new().interval(Duration::from_secs(15)))
}

fn validate_question(question: &str) -> Result<()> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation { message: "question must not be empty".to_string() });
    }
    if trimmed.chars().count() > 2000 {
        return Err(Error::Validation { message: "question exceeds 2000 characters".to_string() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_question_rejects_empty() {
        assert!(validate_question("   ").is_err());
    }

    #[test]
    fn test_validate_question_rejects_too_long() {
        let long = "a".repeat(2001);
        assert!(validate_question(&long).is_err());
    }

    #[test]
    fn test_validate_question_accepts_normal() {
        assert!(validate_question("cual es la penalidad?").is_ok());
    }

    #[test]
    fn test_new_trace_id_is_eight_hex_chars() {
        let id = new_trace_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
