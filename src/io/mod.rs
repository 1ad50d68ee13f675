//! I/O utilities.
//!
//! Unicode-safe helpers used when truncating document and answer text to the
//! character caps the agents enforce.

pub mod unicode;

pub use unicode::find_char_boundary;
