//! SQL DDL for the session log and the vector index.
//!
//! All DDL uses `IF NOT EXISTS` for idempotent initialization. There is no
//! migration path; tables are created on first use.

use rusqlite::Connection;

use crate::embedding::EMBEDDING_DIM;

/// Short-term session transcript.
const SESSION_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session TEXT NOT NULL,
    agent TEXT NOT NULL,
    role TEXT NOT NULL CHECK(role IN ('user','assistant','system','note')),
    content TEXT NOT NULL,
    ts REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_session_ts ON messages(session, ts);
"#;

/// Entry rows for long-term notes and document chunks. Partitioning between the
/// two is carried in `metadata` only.
const VECTOR_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

pub fn init_session_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SESSION_SCHEMA_SQL)
}

pub fn init_vector_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(VECTOR_SCHEMA_SQL)?;
    // vec0 dimensions are fixed at table creation
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS entries_vec USING vec0(
            id TEXT PRIMARY KEY,
            embedding FLOAT[{EMBEDDING_DIM}]
        );"
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn vector_schema_creates_all_tables() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_vector_schema(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"entries".to_string()));
        assert!(tables.contains(&"entries_vec".to_string()));
        assert!(tables.contains(&"index_meta".to_string()));

        let version: String = conn
            .query_row("SELECT vec_version()", [], |r| r.get(0))
            .unwrap();
        assert!(!version.is_empty());
    }

    #[test]
    fn schemas_are_idempotent() {
        crate::db::load_sqlite_vec();
        let conn = Connection::open_in_memory().unwrap();
        init_vector_schema(&conn).unwrap();
        init_vector_schema(&conn).unwrap();
        init_session_schema(&conn).unwrap();
        init_session_schema(&conn).unwrap();
        assert!(table_names(&conn).contains(&"messages".to_string()));
    }

    #[test]
    fn session_schema_rejects_unknown_role() {
        let conn = Connection::open_in_memory().unwrap();
        init_session_schema(&conn).unwrap();
        let err = conn.execute(
            "INSERT INTO messages (session, agent, role, content, ts) VALUES ('s', 'a', 'robot', 'c', 1.0)",
            [],
        );
        assert!(err.is_err());
    }
}
