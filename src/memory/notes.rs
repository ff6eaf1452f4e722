//! Long-term notes: agent-owned text snippets in the vector index.
//!
//! Every note has exactly one owning agent, and recall always filters on it,
//! so one agent's notes never surface in another agent's recall.

use serde_json::Value;

use super::types::{Metadata, NoteHit, KIND_KEY, KIND_NOTE};
use super::vector::{IndexEntry, IndexHit, VectorIndex};
use crate::embedding::Embedder;
use crate::error::{MemoryError, Result};
use crate::rag::query::{retrieve, ScopeFilters};

/// Embed and persist a note for `agent`. Returns the new note id.
pub fn remember(
    index: &VectorIndex,
    embedder: &Embedder,
    agent: &str,
    text: &str,
    tags: &[String],
) -> Result<String> {
    require("agent", agent)?;
    require("text", text)?;

    let embedding = embedder.embed(text)?;
    let id = format!("{agent}:{}", uuid::Uuid::now_v7());

    let mut metadata = Metadata::new();
    metadata.insert("agent".into(), Value::String(agent.to_string()));
    // tags are kept as one JSON string so the metadata stays flat
    metadata.insert("tags".into(), Value::String(serde_json::to_string(tags)?));
    metadata.insert(KIND_KEY.into(), Value::String(KIND_NOTE.into()));

    index.add(&[IndexEntry {
        id: id.clone(),
        text: text.to_string(),
        embedding,
        metadata,
    }])?;

    tracing::info!(id = %id, agent, tags = tags.len(), "note remembered");
    Ok(id)
}

/// The `top_k` notes owned by `agent` nearest to `query`.
pub fn recall(
    index: &VectorIndex,
    embedder: &Embedder,
    agent: &str,
    query: &str,
    top_k: usize,
) -> Result<Vec<NoteHit>> {
    // without an owner the filter would span every agent's notes
    require("agent", agent)?;

    let scopes = ScopeFilters {
        agent: Some(agent.to_string()),
        ..ScopeFilters::default()
    };
    let hits = retrieve(index, embedder, query, top_k, &scopes, KIND_NOTE)?;
    Ok(hits.into_iter().map(to_note_hit).collect())
}

fn to_note_hit(hit: IndexHit) -> NoteHit {
    let agent = hit
        .metadata
        .get("agent")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    NoteHit {
        text: hit.text,
        agent,
        tags: parse_tags(hit.metadata.get("tags")),
        score: hit.score,
    }
}

/// Tags come back as a JSON string; anything unreadable becomes no tags.
fn parse_tags(raw: Option<&Value>) -> Vec<String> {
    match raw {
        Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_default(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MemoryError::config(format!("{name} must not be empty")));
    }
    Ok(())
}
