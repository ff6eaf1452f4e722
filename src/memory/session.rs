//! Session log store: append-only, per-session message transcript.
//!
//! The path-level functions open a fresh connection per call, write or read
//! inside a transaction, and drop the connection. SQLite's own locking
//! serializes concurrent writers; different sessions never share a row.

use rusqlite::{params, Connection};
use std::path::Path;

use crate::db;
use crate::error::{MemoryError, Result};
use crate::memory::types::{Message, Role};

/// Append a message to `session`. Durable once this returns.
pub fn store_message(
    db_path: &Path,
    session: &str,
    agent: &str,
    role: Role,
    content: &str,
) -> Result<i64> {
    let mut conn = db::open_session_db(db_path)?;
    insert_message(&mut conn, session, agent, role, content)
}

/// Newest-first messages for `session`, at most `limit` of them.
pub fn fetch_messages(db_path: &Path, session: &str, limit: usize) -> Result<Vec<Message>> {
    let conn = db::open_session_db(db_path)?;
    recent_messages(&conn, session, limit)
}

/// Insert one message inside its own transaction. Returns the row id.
pub fn insert_message(
    conn: &mut Connection,
    session: &str,
    agent: &str,
    role: Role,
    content: &str,
) -> Result<i64> {
    require_non_empty("session", session)?;
    require_non_empty("agent", agent)?;

    let ts = now_unix_seconds();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO messages (session, agent, role, content, ts) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![session, agent, role.as_str(), content, ts],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    tracing::debug!(session, agent, role = %role, id, "message stored");
    Ok(id)
}

/// Newest-first read. Ties on timestamp fall back to reverse insertion order.
pub fn recent_messages(conn: &Connection, session: &str, limit: usize) -> Result<Vec<Message>> {
    require_non_empty("session", session)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT id, session, agent, role, content, ts FROM messages \
         WHERE session = ?1 ORDER BY ts DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![session, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, session, agent, role, content, timestamp)| {
            let role = role
                .parse::<Role>()
                .map_err(|e| MemoryError::Storage(format!("corrupt message {id}: {e}")))?;
            Ok(Message {
                id,
                session,
                agent,
                role,
                content,
                timestamp,
            })
        })
        .collect()
}

fn now_unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MemoryError::config(format!("{name} must not be empty")));
    }
    Ok(())
}
