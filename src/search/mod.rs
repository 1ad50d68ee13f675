//! Rank fusion for hybrid search.
//!
//! The retrieval port combines lexical (FTS5/BM25) and vector similarity
//! rankings with Reciprocal Rank Fusion; this module only provides the
//! fusion primitive itself, kept storage-agnostic so it can be reused
//! against any backend.

mod rrf;

pub use rrf::{RrfConfig, reciprocal_rank_fusion, weighted_rrf};
