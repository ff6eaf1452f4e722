//! `rag_query`: nearest document chunks within optional scopes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{scoped, to_json};
use crate::error::Result;
use crate::rag::query::ScopeFilters;
use crate::service::MemoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryRequest {
    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(description = "Maximum number of chunks to return. Defaults to 5.")]
    pub top_k: Option<usize>,

    #[schemars(description = "Only return chunks ingested under this agent scope")]
    pub agent_scope: Option<String>,

    #[schemars(description = "Only return chunks ingested under this namespace")]
    pub namespace: Option<String>,
}

pub fn run(
    service: &MemoryService,
    request: QueryRequest,
    default_scope: Option<&str>,
) -> Result<String> {
    let scopes = ScopeFilters {
        agent_scope: scoped(request.agent_scope, default_scope),
        namespace: request.namespace,
        agent: None,
    };
    let top_k = request.top_k.unwrap_or(service.defaults().top_k);
    to_json(&service.query(&request.query, top_k, &scopes)?)
}
