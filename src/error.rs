//! Error kinds shared by every memory operation.
//!
//! Single-item operations (remember, recall, store, fetch, query) surface these
//! directly. Ingestion absorbs [`MemoryError::Extraction`] and per-file
//! [`MemoryError::Storage`] failures into its per-file outcome list.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    /// A required parameter is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The embedding model or a persistent store could not be loaded or opened.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// A single source document could not be parsed.
    #[error("extraction failed for {path}: {message}")]
    Extraction { path: String, message: String },

    /// A read or write against a persistent store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;

impl MemoryError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Initialization(_) => "initialization",
            Self::Extraction { .. } => "extraction",
            Self::Storage(_) => "storage",
        }
    }
}

impl From<rusqlite::Error> for MemoryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(format!("serialization: {e}"))
    }
}

impl From<std::io::Error> for MemoryError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(format!("io: {e}"))
    }
}
