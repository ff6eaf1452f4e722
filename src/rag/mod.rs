//! Document retrieval-augmented generation pipeline.
//!
//! - [`chunker`]: overlapping word windows
//! - [`extract`]: PDF and plain-text extraction
//! - [`ingest`]: directory → chunks → embeddings → vector index
//! - [`query`]: filtered nearest-neighbor retrieval

pub mod chunker;
pub mod extract;
pub mod ingest;
pub mod query;
