//! Persistent nearest-neighbor index over (text, embedding, metadata) entries.
//!
//! Long-term notes and document chunks share one index and are told apart only
//! by metadata. Unfiltered queries use sqlite-vec KNN; filtered queries scan
//! the rows that satisfy every constraint and rank them by `vec_distance_l2`,
//! so a filter never starves the result set the way post-filtering KNN would.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::embedding_to_bytes;
use super::types::{Metadata, MetadataFilter};
use crate::db;
use crate::embedding::EMBEDDING_DIM;
use crate::error::{MemoryError, Result};

/// An entry to write.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

/// A query hit. `score` is the L2 distance; lower is more similar.
#[derive(Debug, Clone, Serialize)]
pub struct IndexHit {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub score: f64,
}

/// A stored entry looked up by id.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEntry {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub created_at: String,
}

/// Process-shared handle on the vector index. One connection, serialized by a mutex.
pub struct VectorIndex {
    conn: Mutex<Connection>,
}

impl VectorIndex {
    /// Open (or create) the index inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_connection(db::open_vector_db(dir)?))
    }

    /// Wrap a connection whose vector schema is already initialized.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| MemoryError::Storage(format!("vector index lock poisoned: {e}")))
    }

    pub fn add(&self, entries: &[IndexEntry]) -> Result<usize> {
        let mut conn = self.lock()?;
        add_entries(&mut conn, entries)
    }

    pub fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<IndexHit>> {
        let conn = self.lock()?;
        query_entries(&conn, embedding, top_k, filter)
    }

    pub fn get(&self, id: &str) -> Result<Option<StoredEntry>> {
        let conn = self.lock()?;
        get_entry(&conn, id)
    }

    pub fn count(&self, filter: &MetadataFilter) -> Result<u64> {
        let conn = self.lock()?;
        count_entries(&conn, filter)
    }

    /// Record `model` as the index's embedding model, warning if vectors were
    /// previously written by a different one.
    pub fn check_embedding_model(&self, model: &str) -> Result<()> {
        let conn = self.lock()?;
        match db::get_embedding_model(&conn)? {
            Some(stored) if stored != model => {
                tracing::warn!(
                    stored = %stored,
                    configured = %model,
                    "embedding model changed, existing vectors are not comparable"
                );
            }
            Some(_) => {}
            None => db::set_embedding_model(&conn, model)?,
        }
        Ok(())
    }
}

/// Write entries in one transaction. Re-adding an id replaces that entry only.
pub fn add_entries(conn: &mut Connection, entries: &[IndexEntry]) -> Result<usize> {
    for entry in entries {
        if entry.id.is_empty() {
            return Err(MemoryError::config("index entry id must not be empty"));
        }
        check_dimensions(&entry.embedding)?;
    }

    let now = chrono::Utc::now().to_rfc3339();
    let tx = conn.transaction()?;
    for entry in entries {
        let metadata = serde_json::to_string(&entry.metadata)?;
        tx.execute(
            "INSERT OR REPLACE INTO entries (id, text, metadata, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![entry.id, entry.text, metadata, now],
        )?;
        // vec0 has no upsert
        tx.execute("DELETE FROM entries_vec WHERE id = ?1", params![entry.id])?;
        tx.execute(
            "INSERT INTO entries_vec (id, embedding) VALUES (?1, ?2)",
            params![entry.id, embedding_to_bytes(&entry.embedding)],
        )?;
    }
    tx.commit()?;

    tracing::debug!(count = entries.len(), "index entries written");
    Ok(entries.len())
}

/// Up to `top_k` entries nearest to `embedding` that satisfy `filter`,
/// ascending by distance. Without a filter, at most [`KNN_MAX_K`] come back.
pub fn query_entries(
    conn: &Connection,
    embedding: &[f32],
    top_k: usize,
    filter: &MetadataFilter,
) -> Result<Vec<IndexHit>> {
    check_dimensions(embedding)?;
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let query_bytes = embedding_to_bytes(embedding);
    if filter.is_empty() {
        knn_search(conn, query_bytes, top_k)
    } else {
        filtered_search(conn, query_bytes, top_k, filter)
    }
}

/// Largest `k` sqlite-vec accepts in a KNN query.
pub const KNN_MAX_K: usize = 4096;

fn knn_search(conn: &Connection, query_bytes: Vec<u8>, top_k: usize) -> Result<Vec<IndexHit>> {
    let k = top_k.min(KNN_MAX_K);
    let mut stmt = conn.prepare(
        "WITH knn AS ( \
             SELECT id, distance FROM entries_vec WHERE embedding MATCH ?1 AND k = ?2 \
         ) \
         SELECT knn.id, knn.distance, e.text, e.metadata \
         FROM knn JOIN entries e ON e.id = knn.id \
         ORDER BY knn.distance",
    )?;
    let rows = stmt
        .query_map(params![query_bytes, k as i64], hit_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_hit).collect()
}

fn filtered_search(
    conn: &Connection,
    query_bytes: Vec<u8>,
    top_k: usize,
    filter: &MetadataFilter,
) -> Result<Vec<IndexHit>> {
    let mut values = vec![Value::Blob(query_bytes)];
    let where_clause = filter_clause(filter, &mut values)?;
    values.push(Value::Integer(top_k as i64));

    let sql = format!(
        "SELECT e.id, vec_distance_l2(v.embedding, ?1) AS distance, e.text, e.metadata \
         FROM entries e JOIN entries_vec v ON v.id = e.id \
         WHERE {where_clause} \
         ORDER BY distance, e.id LIMIT ?{}",
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), hit_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(into_hit).collect()
}

pub fn get_entry(conn: &Connection, id: &str) -> Result<Option<StoredEntry>> {
    let row = conn
        .query_row(
            "SELECT id, text, metadata, created_at FROM entries WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, text, metadata, created_at)| {
        Ok(StoredEntry {
            metadata: parse_metadata(&id, &metadata)?,
            id,
            text,
            created_at,
        })
    })
    .transpose()
}

pub fn count_entries(conn: &Connection, filter: &MetadataFilter) -> Result<u64> {
    let mut values = Vec::new();
    let sql = if filter.is_empty() {
        "SELECT COUNT(*) FROM entries".to_string()
    } else {
        format!(
            "SELECT COUNT(*) FROM entries e WHERE {}",
            filter_clause(filter, &mut values)?
        )
    };
    let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(count as u64)
}

/// Build `json_extract(e.metadata, ?n) = ?m AND ...`, pushing the bound values.
fn filter_clause(filter: &MetadataFilter, values: &mut Vec<Value>) -> Result<String> {
    let mut clauses = Vec::with_capacity(filter.len());
    for (key, value) in filter.iter() {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(MemoryError::config(format!("invalid metadata filter key: {key:?}")));
        }
        values.push(Value::Text(format!("$.{key}")));
        let path_idx = values.len();
        values.push(Value::Text(value.to_string()));
        let value_idx = values.len();
        clauses.push(format!("json_extract(e.metadata, ?{path_idx}) = ?{value_idx}"));
    }
    Ok(clauses.join(" AND "))
}

type HitRow = (String, f64, String, String);

fn hit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HitRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_hit((id, score, text, metadata): HitRow) -> Result<IndexHit> {
    Ok(IndexHit {
        metadata: parse_metadata(&id, &metadata)?,
        id,
        text,
        score,
    })
}

fn parse_metadata(id: &str, raw: &str) -> Result<Metadata> {
    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(MemoryError::Storage(format!(
            "entry {id} has non-object metadata: {other}"
        ))),
    }
}

fn check_dimensions(embedding: &[f32]) -> Result<()> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(MemoryError::config(format!(
            "embedding has {} dimensions, index expects {EMBEDDING_DIM}",
            embedding.len()
        )));
    }
    Ok(())
}
