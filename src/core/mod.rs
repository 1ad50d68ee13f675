//! Core domain models.
//!
//! This module contains the fundamental data structures used throughout the
//! retrieval and chunking pipeline. These are pure domain models with no I/O
//! dependencies.

pub mod chunk;

pub use chunk::{Chunk, ChunkMetadata};
