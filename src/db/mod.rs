//! SQLite plumbing for both persistent stores.
//!
//! The session log lives in its own SQLite file and is opened once per call.
//! The vector index lives in `index.sqlite` inside a configured directory and is
//! opened once per process with the sqlite-vec extension registered.

pub mod schema;

use rusqlite::{Connection, OptionalExtension};
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use crate::error::{MemoryError, Result};

static SQLITE_VEC_INIT: Once = Once::new();

/// File name of the vector index database inside the vector directory.
pub const VECTOR_DB_FILE: &str = "index.sqlite";

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open the session log database, creating the file, parent directory and
/// `messages` table if needed.
pub fn open_session_db(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let conn = Connection::open(path).map_err(|e| {
        MemoryError::Storage(format!("failed to open session db {}: {e}", path.display()))
    })?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::init_session_schema(&conn)?;
    Ok(conn)
}

/// Open (or create) the vector index inside `dir`, with sqlite-vec loaded and
/// schema initialized. Any failure here is an initialization failure.
pub fn open_vector_db(dir: impl AsRef<Path>) -> Result<Connection> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| {
        MemoryError::Initialization(format!(
            "failed to create vector directory {}: {e}",
            dir.display()
        ))
    })?;

    load_sqlite_vec();

    let path = dir.join(VECTOR_DB_FILE);
    let init = |e: rusqlite::Error| {
        MemoryError::Initialization(format!(
            "failed to open vector index at {}: {e}",
            path.display()
        ))
    };

    let conn = Connection::open(&path).map_err(init)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(init)?;
    conn.pragma_update(None, "journal_mode", "WAL").map_err(init)?;
    schema::init_vector_schema(&conn).map_err(init)?;

    tracing::info!(path = %path.display(), "vector index initialized");
    Ok(conn)
}

/// Open an in-memory vector index for testing.
#[cfg(test)]
pub fn open_memory_vector_db() -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory()?;
    schema::init_vector_schema(&conn)?;
    Ok(conn)
}

/// Get the embedding model recorded in the vector index, if any.
pub fn get_embedding_model(conn: &Connection) -> Result<Option<String>> {
    let model = conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = 'embedding_model'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(model)
}

/// Record the embedding model the vectors in this index were produced with.
pub fn set_embedding_model(conn: &Connection, model: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO index_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            MemoryError::Storage(format!(
                "failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}
