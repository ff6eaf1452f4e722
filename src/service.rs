//! The memory service: one context object holding both stores and the embedder.
//!
//! Built once at startup and shared behind an `Arc`. The vector index and the
//! embedding model are opened on first use, exactly once, even when the first
//! calls race; a failed open is remembered and reported as an initialization
//! error on every later call.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::config::CrewMemoryConfig;
use crate::embedding::Embedder;
use crate::error::{MemoryError, Result};
use crate::memory::types::{MessageRecord, NoteHit, Role};
use crate::memory::vector::VectorIndex;
use crate::memory::{notes, session};
use crate::rag::ingest::{self, ingest_directory, IngestOptions, IngestReport};
use crate::rag::query::{query_chunks, ChunkHit, ScopeFilters};

/// Defaults applied when a caller leaves a parameter out.
#[derive(Debug, Clone)]
pub struct ServiceDefaults {
    pub top_k: usize,
    pub fetch_limit: usize,
    pub agent_scope: String,
    pub namespace: String,
    pub patterns: String,
    pub max_words: usize,
    pub overlap_words: usize,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self::from_config(&CrewMemoryConfig::default())
    }
}

impl ServiceDefaults {
    pub fn from_config(config: &CrewMemoryConfig) -> Self {
        Self {
            top_k: config.retrieval.default_top_k,
            fetch_limit: 10,
            agent_scope: config.ingest.agent_scope.clone(),
            namespace: config.ingest.namespace.clone(),
            patterns: config.ingest.patterns.clone(),
            max_words: config.ingest.max_words,
            overlap_words: config.ingest.overlap_words,
        }
    }
}

enum IndexSource {
    Directory { dir: PathBuf, model: String },
    Ready,
}

pub struct MemoryService {
    session_db: PathBuf,
    index_source: IndexSource,
    index: OnceLock<std::result::Result<Arc<VectorIndex>, String>>,
    embedder: Embedder,
    defaults: ServiceDefaults,
}

impl MemoryService {
    /// Service over the configured stores; nothing is opened until first use.
    pub fn new(config: &CrewMemoryConfig) -> Self {
        Self {
            session_db: config.resolved_session_db_path(),
            index_source: IndexSource::Directory {
                dir: config.resolved_vector_dir(),
                model: config.embedding.model.clone(),
            },
            index: OnceLock::new(),
            embedder: Embedder::lazy(config.embedding.clone()),
            defaults: ServiceDefaults::from_config(config),
        }
    }

    /// Service over an already-open index and embedder.
    pub fn from_parts(
        session_db: impl Into<PathBuf>,
        index: VectorIndex,
        embedder: Embedder,
        defaults: ServiceDefaults,
    ) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::new(index)));
        Self {
            session_db: session_db.into(),
            index_source: IndexSource::Ready,
            index: cell,
            embedder,
            defaults,
        }
    }

    pub fn defaults(&self) -> &ServiceDefaults {
        &self.defaults
    }

    /// The vector index, opening it on first call.
    pub fn index(&self) -> Result<Arc<VectorIndex>> {
        let opened = self.index.get_or_init(|| match &self.index_source {
            IndexSource::Directory { dir, model } => VectorIndex::open(dir)
                .and_then(|index| {
                    index.check_embedding_model(model)?;
                    Ok(Arc::new(index))
                })
                .map_err(|e| e.to_string()),
            IndexSource::Ready => Err("vector index was not supplied".into()),
        });
        match opened {
            Ok(index) => Ok(Arc::clone(index)),
            Err(message) => Err(MemoryError::Initialization(message.clone())),
        }
    }

    pub fn remember(&self, agent: &str, text: &str, tags: &[String]) -> Result<String> {
        notes::remember(&*self.index()?, &self.embedder, agent, text, tags)
    }

    pub fn recall(&self, agent: &str, query: &str, top_k: usize) -> Result<Vec<NoteHit>> {
        notes::recall(&*self.index()?, &self.embedder, agent, query, top_k)
    }

    pub fn store_message(&self, session: &str, agent: &str, role: Role, content: &str) -> Result<i64> {
        session::store_message(&self.session_db, session, agent, role, content)
    }

    pub fn fetch_messages(&self, session: &str, limit: usize) -> Result<Vec<MessageRecord>> {
        Ok(session::fetch_messages(&self.session_db, session, limit)?
            .into_iter()
            .map(MessageRecord::from)
            .collect())
    }

    pub fn ingest(&self, options: &IngestOptions) -> Result<IngestReport> {
        // bad arguments are reported before the index is opened
        ingest::validate(options)?;
        ingest_directory(&*self.index()?, &self.embedder, options)
    }

    pub fn query(&self, query: &str, top_k: usize, scopes: &ScopeFilters) -> Result<Vec<ChunkHit>> {
        if query.trim().is_empty() {
            return Err(MemoryError::config("query must not be empty"));
        }
        query_chunks(&*self.index()?, &self.embedder, query, top_k, scopes)
    }
}
