//! Retrieval port: the similarity-search and ingestion interface the graph
//! nodes consume, plus a concrete SQLite-backed implementation and an
//! in-memory fake for tests.

mod memory;
mod pdf;

pub use memory::InMemoryRetrievalService;
pub use pdf::PdfRetrievalService;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An opaque evidence unit returned by the retrieval port.
///
/// Documents are immutable values once retrieved; the core never inspects
/// the underlying vector-store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document text.
    pub content: String,
    /// Metadata map; always carries `source` (filename) and `page`.
    pub metadata: HashMap<String, String>,
    /// Retrieval score, if the backend produced one (higher is better).
    pub score: Option<f64>,
}

impl Document {
    /// Builds a document with `source` and `page` metadata set.
    #[must_use]
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), source.into());
        metadata.insert("page".to_string(), page.to_string());
        Self {
            content: content.into(),
            metadata,
            score: None,
        }
    }

    /// Sets the retrieval score.
    #[must_use]
    pub const fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Returns the `source` metadata field, or `"unknown"` if absent.
    #[must_use]
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Returns the `page` metadata field parsed as an integer, or `0`.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.metadata
            .get("page")
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
    }
}

/// A single indexed document summary, as returned by `get_indexed_documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Original filename.
    pub name: String,
    /// Number of chunks stored for this document.
    pub chunks: usize,
}

/// Retrieval port consumed by the graph nodes. The core never depends on
/// the underlying vector-store identity.
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Returns the `k` best-matching documents for `query`, best-first.
    ///
    /// When the index is empty, returns an empty vector; the core treats
    /// this as the "no documents" terminal case.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>>;

    /// Ingests a PDF at `path`, returning the number of chunks produced.
    /// Idempotent per `original_filename`: re-ingesting the same filename
    /// replaces its previously stored chunks.
    async fn ingest_document(&self, path: &std::path::Path, original_filename: &str) -> Result<usize>;

    /// Clears the entire index.
    async fn clear_index(&self) -> Result<bool>;

    /// Returns a free-form stats map (document count, chunk count, etc).
    async fn get_stats(&self) -> Result<HashMap<String, serde_json::Value>>;

    /// Lists indexed documents and their chunk counts.
    async fn get_indexed_documents(&self) -> Result<Vec<IndexedDocument>>;

    /// Returns `true` if the backend is reachable and operational.
    async fn health_check(&self) -> bool;
}
