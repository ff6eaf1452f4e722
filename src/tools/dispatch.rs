//! In-process tool façade.
//!
//! A [`ToolSpec`] pairs an [`Operation`] with an optional default scope. Crews
//! that want a tool bound to one agent (or one document scope) build a spec
//! with `default_scope` set instead of defining a new tool type; the caller can
//! still override it per call.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{MemoryError, Result};
use crate::service::MemoryService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Remember,
    Recall,
    StoreMessage,
    FetchMessages,
    Ingest,
    Query,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Self::Remember,
        Self::Recall,
        Self::StoreMessage,
        Self::FetchMessages,
        Self::Ingest,
        Self::Query,
    ];

    /// Tool name shared by both façades.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Remember => "vector_remember",
            Self::Recall => "vector_recall",
            Self::StoreMessage => "st_store",
            Self::FetchMessages => "st_fetch",
            Self::Ingest => "rag_ingest",
            Self::Query => "rag_query",
        }
    }

    /// Whether a default scope means anything for this operation.
    pub fn is_scoped(&self) -> bool {
        !matches!(self, Self::StoreMessage | Self::FetchMessages)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tool_name())
    }
}

impl std::str::FromStr for Operation {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.tool_name() == s)
            .ok_or_else(|| MemoryError::config(format!("unknown tool: {s}")))
    }
}

/// One tool: an operation plus the scope it falls back to.
///
/// For `rag_ingest` and `rag_query` the default fills `agent_scope`; for
/// `vector_remember` and `vector_recall` it fills `agent`. Message tools
/// ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub operation: Operation,
    pub default_scope: Option<String>,
}

impl ToolSpec {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            default_scope: None,
        }
    }

    pub fn scoped(operation: Operation, scope: impl Into<String>) -> Self {
        Self {
            operation,
            default_scope: Some(scope.into()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.operation.tool_name()
    }

    /// All six tools, scoped ones bound to `default_scope`.
    pub fn toolset(default_scope: Option<&str>) -> Vec<ToolSpec> {
        Operation::ALL
            .into_iter()
            .map(|operation| ToolSpec {
                operation,
                default_scope: default_scope
                    .filter(|_| operation.is_scoped())
                    .map(str::to_string),
            })
            .collect()
    }

    /// Run the tool with a JSON object of arguments. Returns the tool's JSON
    /// (or plain `"saved"` / `"stored"`) result string.
    pub fn invoke(&self, service: &MemoryService, args: Value) -> Result<String> {
        let scope = self.default_scope.as_deref();
        tracing::debug!(tool = self.name(), scope, "tool invoked");
        match self.operation {
            Operation::Remember => super::vector_remember::run(service, self.parse(args)?, scope),
            Operation::Recall => super::vector_recall::run(service, self.parse(args)?, scope),
            Operation::StoreMessage => super::st_store::run(service, self.parse(args)?),
            Operation::FetchMessages => super::st_fetch::run(service, self.parse(args)?),
            Operation::Ingest => super::rag_ingest::run(service, self.parse(args)?, scope),
            Operation::Query => super::rag_query::run(service, self.parse(args)?, scope),
        }
    }

    fn parse<T: DeserializeOwned>(&self, args: Value) -> Result<T> {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        serde_json::from_value(args)
            .map_err(|e| MemoryError::config(format!("invalid arguments for {}: {e}", self.name())))
    }
}
