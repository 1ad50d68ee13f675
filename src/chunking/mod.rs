//! Chunking strategies.
//!
//! Document ingestion chunks each PDF page with [`FixedChunker`], a simple
//! character-based strategy with configurable size and overlap.

pub mod fixed;
pub mod traits;

pub use fixed::FixedChunker;
pub use traits::{ChunkMetadata as ChunkerMetadata, Chunker};

/// Default chunk size in characters (~750 tokens at 4 chars/token).
/// Sized for granular semantic search with embeddings.
pub const DEFAULT_CHUNK_SIZE: usize = 3_000;

/// Default overlap size in characters (for context continuity).
pub const DEFAULT_OVERLAP: usize = 500;

/// Maximum allowed chunk size (50k chars, ~12.5k tokens).
pub const MAX_CHUNK_SIZE: usize = 50_000;
