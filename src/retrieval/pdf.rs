//! SQLite-backed retrieval port: PDF text extraction, fixed-size chunking,
//! hash-based fallback embeddings, and hybrid lexical+semantic search fused
//! with Reciprocal Rank Fusion.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;

use super::{Document, IndexedDocument, RetrievalService};
use crate::chunking::{Chunker, FixedChunker};
use crate::embedding::{Embedder, FallbackEmbedder, cosine_similarity};
use crate::error::{Result, RetrievalError};
use crate::search::{RrfConfig, reciprocal_rank_fusion};

/// Default top-k multiplier used when gathering candidates for each ranking
/// channel before fusion.
const CANDIDATE_MULTIPLIER: usize = 3;

/// A `PdfRetrievalService` backed by an in-process SQLite database.
///
/// Ingestion extracts text per PDF page, chunks each page with
/// [`FixedChunker`], embeds each chunk with an [`Embedder`], and stores rows
/// keyed by `(source, page, chunk_index)`. Search combines a lexical
/// overlap score and a cosine-similarity score over embeddings, fused with
/// RRF.
pub struct PdfRetrievalService {
    conn: Mutex<Connection>,
    embedder: Box<dyn Embedder>,
    chunker: FixedChunker,
}

struct Row {
    id: i64,
    source: String,
    page: u32,
    content: String,
    embedding: Vec<f32>,
}

impl PdfRetrievalService {
    /// Opens (or creates) the SQLite database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Database`] if the connection or schema
    /// creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(RetrievalError::from)?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory SQLite database, useful for tests.
    ///
    /// # Errors
    ///
    /// Returns [`RetrievalError::Database`] if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(RetrievalError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                page INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            )",
            [],
        )
        .map_err(RetrievalError::from)?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)",
            [],
        )
        .map_err(RetrievalError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder: Box::new(FallbackEmbedder::new(crate::embedding::DEFAULT_DIMENSIONS)),
            chunker: FixedChunker::new(),
        })
    }

    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
        blob.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    fn all_rows(&self) -> Result<Vec<Row>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn
            .prepare("SELECT id, source, page, content, embedding FROM chunks")
            .map_err(RetrievalError::from)?;
        let rows = stmt
            .query_map([], |row| {
                let blob: Vec<u8> = row.get(4)?;
                Ok(Row {
                    id: row.get(0)?,
                    source: row.get(1)?,
                    page: row.get::<_, i64>(2)? as u32,
                    content: row.get(3)?,
                    embedding: Self::blob_to_embedding(&blob),
                })
            })
            .map_err(RetrievalError::from)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| RetrievalError::Database(e.to_string()).into())
    }

    fn lexical_score(query_terms: &[String], content: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let lower = content.to_lowercase();
        let matches = query_terms.iter().filter(|t| lower.contains(t.as_str())).count();
        matches as f64 / query_terms.len() as f64
    }
}

#[async_trait]
impl RetrievalService for PdfRetrievalService {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let rows = self.all_rows()?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query_terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let query_embedding = self.embedder.embed(query)?;

        let candidates = (k * CANDIDATE_MULTIPLIER).max(k);

        let mut lexical: Vec<(i64, f64)> = rows
            .iter()
            .map(|r| (r.id, Self::lexical_score(&query_terms, &r.content)))
            .collect();
        lexical.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        lexical.truncate(candidates);

        let mut semantic: Vec<(i64, f32)> = rows
            .iter()
            .map(|r| (r.id, cosine_similarity(&query_embedding, &r.embedding)))
            .collect();
        semantic.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        semantic.truncate(candidates);

        let lexical_ids: Vec<i64> = lexical.iter().map(|(id, _)| *id).collect();
        let semantic_ids: Vec<i64> = semantic.iter().map(|(id, _)| *id).collect();

        let fused = reciprocal_rank_fusion(&[&lexical_ids, &semantic_ids], &RrfConfig::default());

        let by_id: HashMap<i64, &Row> = rows.iter().map(|r| (r.id, r)).collect();

        Ok(fused
            .into_iter()
            .take(k)
            .filter_map(|(id, score)| {
                by_id.get(&id).map(|row| {
                    Document::new(row.content.clone(), row.source.clone(), row.page).with_score(score)
                })
            })
            .collect())
    }

    async fn ingest_document(&self, path: &Path, original_filename: &str) -> Result<usize> {
        let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| RetrievalError::PdfExtraction {
            source: original_filename.to_string(),
            reason: e.to_string(),
        })?;

        {
            let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
            conn.execute(
                "DELETE FROM chunks WHERE source = ?1",
                [original_filename],
            )
            .map_err(RetrievalError::from)?;
        }

        let mut total_chunks = 0usize;
        for (page_index, page_text) in pages.iter().enumerate() {
            let page_number = u32::try_from(page_index + 1).unwrap_or(u32::MAX);
            let chunks = self.chunker.chunk(0, page_text, None)?;
            for chunk in &chunks {
                let embedding = self.embedder.embed(&chunk.content)?;
                let blob = Self::embedding_to_blob(&embedding);
                let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
                conn.execute(
                    "INSERT INTO chunks (source, page, chunk_index, content, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        original_filename,
                        page_number,
                        chunk.index as i64,
                        chunk.content,
                        blob
                    ],
                )
                .map_err(RetrievalError::from)?;
                total_chunks += 1;
            }
        }

        Ok(total_chunks)
    }

    async fn clear_index(&self) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute("DELETE FROM chunks", []).map_err(RetrievalError::from)?;
        Ok(true)
    }

    async fn get_stats(&self) -> Result<HashMap<String, serde_json::Value>> {
        let rows = self.all_rows()?;
        let mut sources: std::collections::HashSet<String> = std::collections::HashSet::new();
        for row in &rows {
            sources.insert(row.source.clone());
        }
        let mut stats = HashMap::new();
        stats.insert("chunk_count".to_string(), serde_json::Value::from(rows.len()));
        stats.insert(
            "document_count".to_string(),
            serde_json::Value::from(sources.len()),
        );
        Ok(stats)
    }

    async fn get_indexed_documents(&self) -> Result<Vec<IndexedDocument>> {
        let rows = self.all_rows()?;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in &rows {
            *counts.entry(row.source.clone()).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(name, chunks)| IndexedDocument { name, chunks })
            .collect())
    }

    async fn health_check(&self) -> bool {
        self.conn
            .lock()
            .map(|conn| conn.execute("SELECT 1", []).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let service = PdfRetrievalService::in_memory().unwrap();
        let results = service.similarity_search("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_clear_index_empties_stats() {
        let service = PdfRetrievalService::in_memory().unwrap();
        service.clear_index().await.unwrap();
        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats["chunk_count"], serde_json::Value::from(0));
    }

    #[tokio::test]
    async fn test_health_check_on_open_connection() {
        let service = PdfRetrievalService::in_memory().unwrap();
        assert!(service.health_check().await);
    }

    #[test]
    fn test_embedding_blob_roundtrip() {
        let embedding = vec![0.5_f32, -1.25, 3.0];
        let blob = PdfRetrievalService::embedding_to_blob(&embedding);
        let decoded = PdfRetrievalService::blob_to_embedding(&blob);
        assert_eq!(decoded, embedding);
    }
}
