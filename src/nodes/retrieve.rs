//! `retrieve` node: calls the retrieval port and sets the no-documents
//! short-circuit when the index comes back empty.

use std::sync::Arc;

use crate::domain::{Domain, NO_DOCUMENTS_MESSAGE};
use crate::graph::engine::{NodeFn, NodeFuture};
use crate::graph::state::{AgentState, StateUpdate};
use crate::retrieval::RetrievalService;

/// Builds the `retrieve` node, closing over the retrieval port and the
/// configured top-k.
#[must_use]
pub fn build(retrieval: Arc<dyn RetrievalService>, k: usize) -> NodeFn {
    Box::new(move |state: &AgentState| -> NodeFuture<'_> {
        let retrieval = Arc::clone(&retrieval);
        let question = state.question.clone();
        Box::pin(async move {
            let docs = match retrieval.similarity_search(&question, k).await {
                Ok(docs) => docs,
                Err(_) => {
                    return Ok(StateUpdate {
                        context: Some(Vec::new()),
                        filtered_context: Some(Vec::new()),
                        revision_count: Some(0),
                        ..StateUpdate::empty()
                    });
                }
            };

            if docs.is_empty() {
                return Ok(StateUpdate {
                    context: Some(Vec::new()),
                    filtered_context: Some(Vec::new()),
                    domain: Some(Domain::None),
                    answer: Some(NO_DOCUMENTS_MESSAGE.to_string()),
                    audit_result: Some("pass".to_string()),
                    no_documents: Some(true),
                    ..StateUpdate::empty()
                });
            }

            Ok(StateUpdate { context: Some(docs), revision_count: Some(0), ..StateUpdate::empty() })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{Document, IndexedDocument, InMemoryRetrievalService};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FailingRetrievalService;

    #[async_trait]
    impl RetrievalService for FailingRetrievalService {
        async fn similarity_search(&self, _query: &str, _k: usize) -> crate::error::Result<Vec<Document>> {
            Err(crate::error::RetrievalError::NotInitialized.into())
        }

        async fn ingest_document(
            &self,
            _path: &std::path::Path,
            _original_filename: &str,
        ) -> crate::error::Result<usize> {
            Err(crate::error::RetrievalError::NotInitialized.into())
        }

        async fn clear_index(&self) -> crate::error::Result<bool> {
            Ok(false)
        }

        async fn get_stats(&self) -> crate::error::Result<HashMap<String, serde_json::Value>> {
            Ok(HashMap::new())
        }

        async fn get_indexed_documents(&self) -> crate::error::Result<Vec<IndexedDocument>> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_retrieve_propagates_no_context_on_backend_failure() {
        let retrieval: Arc<dyn RetrievalService> = Arc::new(FailingRetrievalService);
        let node = build(retrieval, 5);
        let state = AgentState::new("abcd1234", "pregunta");

        let update = node(&state).await.unwrap();
        assert_eq!(update.context, Some(Vec::new()));
        assert_eq!(update.filtered_context, Some(Vec::new()));
        assert_eq!(update.revision_count, Some(0));
        assert_eq!(update.no_documents, None);
    }

    #[tokio::test]
    async fn test_retrieve_empty_index_sets_no_documents() {
        let retrieval: Arc<dyn RetrievalService> = Arc::new(InMemoryRetrievalService::new());
        let node = build(retrieval, 5);
        let state = AgentState::new("abcd1234", "pregunta");
        let update = node(&state).await.unwrap();
        assert_eq!(update.no_documents, Some(true));
        assert_eq!(update.domain, Some(Domain::None));
    }

    #[tokio::test]
    async fn test_retrieve_nonempty_index_sets_context() {
        let retrieval: Arc<dyn RetrievalService> =
            Arc::new(InMemoryRetrievalService::with_documents(vec![Document::new("contenido", "f.pdf", 1)]));
        let node = build(retrieval, 5);
        let state = AgentState::new("abcd1234", "pregunta sobre contenido");
        let update = node(&state).await.unwrap();
        assert_eq!(update.context.unwrap().len(), 1);
        assert_eq!(update.revision_count, Some(0));
    }
}
