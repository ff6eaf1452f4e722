//! Shared memory for LLM agent crews, served over MCP.
//!
//! Three kinds of memory live behind one [`service::MemoryService`]:
//!
//! | Memory | Store | Operations |
//! |--------|-------|------------|
//! | **Session log** | SQLite file, one row per message | `store_message`, `fetch_messages` |
//! | **Long-term notes** | vector index, `kind = "note"` | `remember`, `recall` |
//! | **Document chunks** | vector index, `kind = "chunk"` | `ingest`, `query` |
//!
//! Notes are owned by one agent and only recalled by that agent. Chunks carry
//! an `agent_scope` and a `namespace` that queries can filter on.
//!
//! # Architecture
//!
//! - **Storage**: SQLite for session messages;
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) for the vector index
//! - **Embeddings**: local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   loaded on first use
//! - **Documents**: PDF (`lopdf`) and plain text, split into overlapping word windows
//! - **Transport**: MCP over stdio or streamable HTTP, plus an in-process
//!   [`tools::ToolSpec`] façade
//!
//! # Modules
//!
//! - [`config`]: TOML file and environment configuration
//! - [`db`]: SQLite opening, sqlite-vec registration, schemas
//! - [`embedding`]: embedding provider trait, ONNX provider, lazy [`embedding::Embedder`]
//! - [`memory`]: session log, vector index, long-term notes
//! - [`rag`]: chunking, extraction, ingestion, retrieval
//! - [`service`]: the context object every façade calls into
//! - [`tools`]: typed requests, in-process tools, MCP tool router

pub mod cli;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod memory;
pub mod rag;
pub mod server;
pub mod service;
pub mod tools;

pub use error::{MemoryError, Result};
pub use service::MemoryService;
