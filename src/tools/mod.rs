//! Tool façades over [`MemoryService`].
//!
//! Each operation has a typed request struct and a `run` function in its own
//! module. [`dispatch::ToolSpec`] invokes them in-process from JSON arguments;
//! [`CrewMemoryTools`] exposes the same six tools over MCP.

pub mod dispatch;
pub mod rag_ingest;
pub mod rag_query;
pub mod st_fetch;
pub mod st_store;
pub mod vector_recall;
pub mod vector_remember;

use rag_ingest::IngestRequest;
use rag_query::QueryRequest;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde::Serialize;
use st_fetch::FetchMessagesRequest;
use st_store::StoreMessageRequest;
use std::sync::Arc;
use vector_recall::RecallRequest;
use vector_remember::RememberRequest;

use crate::service::MemoryService;

pub use dispatch::{Operation, ToolSpec};

/// Explicit value if non-empty, else the tool's default scope.
fn scoped(explicit: Option<String>, default_scope: Option<&str>) -> Option<String> {
    explicit
        .filter(|s| !s.trim().is_empty())
        .or_else(|| default_scope.map(str::to_string))
}

fn to_json<T: Serialize>(value: &T) -> crate::Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// The MCP tool handler. Holds the shared [`MemoryService`] and exposes all
/// tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct CrewMemoryTools {
    tool_router: ToolRouter<Self>,
    service: Arc<MemoryService>,
}

impl CrewMemoryTools {
    /// Run an operation on the blocking pool; embedding and SQLite work never
    /// runs on the async executor.
    async fn blocking<F>(&self, tool: &'static str, op: F) -> Result<String, String>
    where
        F: FnOnce(&MemoryService) -> crate::Result<String> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || op(&service))
            .await
            .map_err(|e| format!("{tool} task failed: {e}"))?
            .map_err(|e| {
                tracing::warn!(tool, kind = e.kind(), error = %e, "tool call failed");
                e.to_string()
            })
    }
}

#[tool_router]
impl CrewMemoryTools {
    pub fn new(service: Arc<MemoryService>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }

    #[tool(description = "Save a long-term note for an agent. Returns 'saved'.")]
    async fn vector_remember(
        &self,
        Parameters(request): Parameters<RememberRequest>,
    ) -> Result<String, String> {
        tracing::info!(agent = ?request.agent, tags = request.tags.len(), "vector_remember called");
        self.blocking("vector_remember", move |s| vector_remember::run(s, request, None))
            .await
    }

    #[tool(description = "Recall an agent's long-term notes nearest to a query. Returns [{text, agent, tags, score}], lower score is closer.")]
    async fn vector_recall(
        &self,
        Parameters(request): Parameters<RecallRequest>,
    ) -> Result<String, String> {
        tracing::info!(agent = ?request.agent, top_k = ?request.top_k, "vector_recall called");
        self.blocking("vector_recall", move |s| vector_recall::run(s, request, None))
            .await
    }

    #[tool(description = "Append a message to a session transcript. Returns 'stored'.")]
    async fn st_store(
        &self,
        Parameters(request): Parameters<StoreMessageRequest>,
    ) -> Result<String, String> {
        tracing::info!(session = %request.session, agent = %request.agent, "st_store called");
        self.blocking("st_store", move |s| st_store::run(s, request)).await
    }

    #[tool(description = "Fetch the most recent messages of a session, newest first. Returns [{agent, role, content, ts}].")]
    async fn st_fetch(
        &self,
        Parameters(request): Parameters<FetchMessagesRequest>,
    ) -> Result<String, String> {
        tracing::info!(session = %request.session, limit = ?request.limit, "st_fetch called");
        self.blocking("st_fetch", move |s| st_fetch::run(s, request)).await
    }

    #[tool(description = "Ingest PDF and text documents from a directory into the shared index. Returns {files, chunks_added, outcomes}.")]
    async fn rag_ingest(
        &self,
        Parameters(request): Parameters<IngestRequest>,
    ) -> Result<String, String> {
        tracing::info!(directory = %request.directory, "rag_ingest called");
        self.blocking("rag_ingest", move |s| rag_ingest::run(s, request, None))
            .await
    }

    #[tool(description = "Query ingested document chunks, optionally filtered by agent_scope and namespace. Returns [{text, path, agent_scope, namespace, chunk, score}].")]
    async fn rag_query(
        &self,
        Parameters(request): Parameters<QueryRequest>,
    ) -> Result<String, String> {
        tracing::info!(
            top_k = ?request.top_k,
            agent_scope = ?request.agent_scope,
            namespace = ?request.namespace,
            "rag_query called"
        );
        self.blocking("rag_query", move |s| rag_query::run(s, request, None))
            .await
    }
}

#[tool_handler]
impl ServerHandler for CrewMemoryTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Shared memory for an agent crew. st_store/st_fetch keep session transcripts, \
                 vector_remember/vector_recall keep per-agent long-term notes, and \
                 rag_ingest/rag_query index and search documents."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, EmbeddingProvider, EMBEDDING_DIM};
    use crate::memory::vector::VectorIndex;
    use crate::service::ServiceDefaults;

    /// Every text lands on the axis of its first byte.
    struct FirstByte;

    impl EmbeddingProvider for FirstByte {
        fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            let mut v = vec![0.0f32; EMBEDDING_DIM];
            v[text.bytes().next().unwrap_or(0) as usize % EMBEDDING_DIM] = 1.0;
            Ok(v)
        }
    }

    fn mcp_tools(tmp: &tempfile::TempDir) -> CrewMemoryTools {
        let index = VectorIndex::from_connection(crate::db::open_memory_vector_db().unwrap());
        let service = MemoryService::from_parts(
            tmp.path().join("st.sqlite"),
            index,
            Embedder::ready(Arc::new(FirstByte)),
            ServiceDefaults::default(),
        );
        CrewMemoryTools::new(Arc::new(service))
    }

    #[test]
    fn router_lists_all_six_tools() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = mcp_tools(&tmp);
        let mut names: Vec<String> = tools
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        let mut expected: Vec<String> = Operation::ALL
            .iter()
            .map(|op| op.tool_name().to_string())
            .collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn mcp_message_tools_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = mcp_tools(&tmp);

        let stored = tools
            .st_store(Parameters(StoreMessageRequest {
                session: "run-1".into(),
                agent: "devops".into(),
                role: Some("assistant".into()),
                content: "pipeline green".into(),
            }))
            .await
            .unwrap();
        assert_eq!(stored, "stored");

        let fetched = tools
            .st_fetch(Parameters(FetchMessagesRequest {
                session: "run-1".into(),
                limit: None,
            }))
            .await
            .unwrap();
        let records: serde_json::Value = serde_json::from_str(&fetched).unwrap();
        assert_eq!(records[0]["agent"], "devops");
        assert_eq!(records[0]["role"], "assistant");
        assert_eq!(records[0]["content"], "pipeline green");
    }

    #[tokio::test]
    async fn mcp_notes_round_trip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = mcp_tools(&tmp);

        let saved = tools
            .vector_remember(Parameters(RememberRequest {
                agent: Some("manager".into()),
                text: "ship on friday".into(),
                tags: vec!["release".into()],
            }))
            .await
            .unwrap();
        assert_eq!(saved, "saved");

        let recalled = tools
            .vector_recall(Parameters(RecallRequest {
                agent: Some("manager".into()),
                query: "ship date".into(),
                top_k: Some(3),
            }))
            .await
            .unwrap();
        let hits: serde_json::Value = serde_json::from_str(&recalled).unwrap();
        assert_eq!(hits.as_array().unwrap().len(), 1);
        assert_eq!(hits[0]["tags"], serde_json::json!(["release"]));
    }

    #[tokio::test]
    async fn mcp_errors_carry_their_kind() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tools = mcp_tools(&tmp);

        let err = tools
            .st_store(Parameters(StoreMessageRequest {
                session: "run-1".into(),
                agent: "qa".into(),
                role: Some("robot".into()),
                content: "x".into(),
            }))
            .await
            .unwrap_err();
        assert!(err.starts_with("configuration error"), "{err}");

        let err = tools
            .rag_query(Parameters(QueryRequest {
                query: " ".into(),
                top_k: None,
                agent_scope: None,
                namespace: None,
            }))
            .await
            .unwrap_err();
        assert!(err.starts_with("configuration error"), "{err}");
    }

    #[test]
    fn explicit_scope_wins_over_default() {
        assert_eq!(scoped(Some("qa".into()), Some("dev")).as_deref(), Some("qa"));
        assert_eq!(scoped(Some(" ".into()), Some("dev")).as_deref(), Some("dev"));
        assert_eq!(scoped(None, Some("dev")).as_deref(), Some("dev"));
        assert_eq!(scoped(None, None), None);
    }
}
