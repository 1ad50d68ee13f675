//! In-memory retrieval fake used by tests and DI overrides.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Document, IndexedDocument, RetrievalService};
use crate::error::Result;

/// An in-memory, lexical-overlap-only implementation of [`RetrievalService`].
/// Documents are seeded directly via [`InMemoryRetrievalService::seed`];
/// `ingest_document` is a no-op that reports zero chunks, since tests push
/// documents directly rather than through PDF extraction.
#[derive(Default)]
pub struct InMemoryRetrievalService {
    documents: Mutex<Vec<Document>>,
}

impl InMemoryRetrievalService {
    /// Creates an empty fake.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fake pre-seeded with `documents`.
    #[must_use]
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents: Mutex::new(documents),
        }
    }

    /// Adds documents to the fake's in-memory store.
    pub fn seed(&self, documents: Vec<Document>) {
        if let Ok(mut guard) = self.documents.lock() {
            guard.extend(documents);
        }
    }

    fn lexical_score(query: &str, doc: &Document) -> f64 {
        let query_terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if query_terms.is_empty() {
            return 0.0;
        }
        let content_lower = doc.content.to_lowercase();
        let matches = query_terms
            .iter()
            .filter(|term| content_lower.contains(term.as_str()))
            .count();
        matches as f64 / query_terms.len() as f64
    }
}

#[async_trait]
impl RetrievalService for InMemoryRetrievalService {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let guard = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let mut scored: Vec<(f64, Document)> = guard
            .iter()
            .map(|doc| (Self::lexical_score(query, doc), doc.clone()))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, doc)| doc.with_score(score))
            .collect())
    }

    async fn ingest_document(&self, _path: &std::path::Path, _original_filename: &str) -> Result<usize> {
        Ok(0)
    }

    async fn clear_index(&self) -> Result<bool> {
        if let Ok(mut guard) = self.documents.lock() {
            guard.clear();
        }
        Ok(true)
    }

    async fn get_stats(&self) -> Result<HashMap<String, serde_json::Value>> {
        let guard = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let mut stats = HashMap::new();
        stats.insert(
            "document_count".to_string(),
            serde_json::Value::from(guard.len()),
        );
        Ok(stats)
    }

    async fn get_indexed_documents(&self) -> Result<Vec<IndexedDocument>> {
        let guard = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let mut counts: HashMap<String, usize> = HashMap::new();
        for doc in guard.iter() {
            *counts.entry(doc.source().to_string()).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, chunks)| IndexedDocument { name, chunks })
            .collect())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_similarity_search_ranks_by_overlap() {
        let service = InMemoryRetrievalService::with_documents(vec![
            Document::new("the budget is 500000 usd", "rfp.pdf", 1),
            Document::new("this section discusses confidentiality", "rfp.pdf", 2),
        ]);

        let results = service.similarity_search("what is the budget", 10).await.unwrap();
        assert_eq!(results[0].source(), "rfp.pdf");
        assert!(results[0].content.contains("budget"));
    }

    #[tokio::test]
    async fn test_similarity_search_empty_index() {
        let service = InMemoryRetrievalService::new();
        let results = service.similarity_search("anything", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_clear_index() {
        let service = InMemoryRetrievalService::with_documents(vec![Document::new(
            "content", "a.pdf", 1,
        )]);
        assert!(service.clear_index().await.unwrap());
        let results = service.similarity_search("content", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_get_indexed_documents_groups_by_source() {
        let service = InMemoryRetrievalService::with_documents(vec![
            Document::new("a", "one.pdf", 1),
            Document::new("b", "one.pdf", 2),
            Document::new("c", "two.pdf", 1),
        ]);
        let docs = service.get_indexed_documents().await.unwrap();
        let one = docs.iter().find(|d| d.name == "one.pdf").unwrap();
        assert_eq!(one.chunks, 2);
    }

    #[tokio::test]
    async fn test_health_check_always_true() {
        let service = InMemoryRetrievalService::new();
        assert!(service.health_check().await);
    }
}
