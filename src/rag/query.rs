//! Retrieval: embed a query once, filter by scope, rank by distance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedding::Embedder;
use crate::error::{MemoryError, Result};
use crate::memory::types::{MetadataFilter, KIND_CHUNK, KIND_KEY};
use crate::memory::vector::{IndexHit, VectorIndex};

/// Optional scope constraints. Absent or empty values are left out of the
/// filter rather than matched against null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilters {
    pub agent_scope: Option<String>,
    pub namespace: Option<String>,
    pub agent: Option<String>,
}

impl ScopeFilters {
    /// Conjunctive filter over the supplied scopes plus the entry kind.
    pub fn to_filter(&self, kind: &str) -> MetadataFilter {
        MetadataFilter::new()
            .eq_opt("agent_scope", self.agent_scope.as_deref())
            .eq_opt("namespace", self.namespace.as_deref())
            .eq_opt("agent", self.agent.as_deref())
            .eq(KIND_KEY, kind)
    }
}

/// A document chunk returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHit {
    pub text: String,
    pub path: Option<String>,
    pub agent_scope: Option<String>,
    pub namespace: Option<String>,
    pub chunk: Option<i64>,
    /// L2 distance to the query; lower is more similar.
    pub score: f64,
}

impl From<IndexHit> for ChunkHit {
    fn from(hit: IndexHit) -> Self {
        let text_field = |key: &str| {
            hit.metadata
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            path: text_field("path"),
            agent_scope: text_field("agent_scope"),
            namespace: text_field("namespace"),
            chunk: hit.metadata.get("chunk").and_then(Value::as_i64),
            text: hit.text,
            score: hit.score,
        }
    }
}

/// Nearest `top_k` entries of `kind` within `scopes`. Rejects an empty query
/// before the embedder or the index is touched.
pub fn retrieve(
    index: &VectorIndex,
    embedder: &Embedder,
    query: &str,
    top_k: usize,
    scopes: &ScopeFilters,
    kind: &str,
) -> Result<Vec<IndexHit>> {
    if query.trim().is_empty() {
        return Err(MemoryError::config("query must not be empty"));
    }

    let embedding = embedder.embed(query)?;
    let filter = scopes.to_filter(kind);
    let hits = index.query(&embedding, top_k, &filter)?;

    tracing::info!(
        kind,
        top_k,
        constraints = filter.len(),
        returned = hits.len(),
        "retrieval complete"
    );
    Ok(hits)
}

/// Query ingested document chunks.
pub fn query_chunks(
    index: &VectorIndex,
    embedder: &Embedder,
    query: &str,
    top_k: usize,
    scopes: &ScopeFilters,
) -> Result<Vec<ChunkHit>> {
    Ok(retrieve(index, embedder, query, top_k, scopes, KIND_CHUNK)?
        .into_iter()
        .map(ChunkHit::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_includes_only_supplied_scopes() {
        let scopes = ScopeFilters {
            namespace: Some("ns1".into()),
            agent_scope: Some(String::new()),
            agent: None,
        };
        let filter = scopes.to_filter(KIND_CHUNK);
        let pairs: Vec<_> = filter.iter().collect();
        assert_eq!(pairs, vec![("kind", "chunk"), ("namespace", "ns1")]);
    }

    #[test]
    fn empty_query_never_touches_embedder() {
        let index = VectorIndex::from_connection(crate::db::open_memory_vector_db().unwrap());
        let embedder = Embedder::with_loader(|| anyhow::bail!("must not load"));
        let err = query_chunks(&index, &embedder, "   ", 5, &ScopeFilters::default()).unwrap_err();
        assert_eq!(err.kind(), "configuration");
        assert!(!embedder.is_initialized());
    }

    #[test]
    fn chunk_hit_maps_metadata() {
        let hit = IndexHit {
            id: "docs/a.txt:1:x".into(),
            text: "body".into(),
            metadata: json!({"path": "docs/a.txt", "agent_scope": "shared", "namespace": "ns1", "chunk": 1})
                .as_object()
                .cloned()
                .unwrap(),
            score: 0.25,
        };
        let chunk = ChunkHit::from(hit);
        assert_eq!(chunk.path.as_deref(), Some("docs/a.txt"));
        assert_eq!(chunk.agent_scope.as_deref(), Some("shared"));
        assert_eq!(chunk.namespace.as_deref(), Some("ns1"));
        assert_eq!(chunk.chunk, Some(1));
        assert_eq!(chunk.score, 0.25);
    }
}
