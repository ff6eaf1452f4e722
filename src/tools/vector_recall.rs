//! `vector_recall`: nearest long-term notes of one agent.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{scoped, to_json};
use crate::error::Result;
use crate::service::MemoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallRequest {
    #[schemars(description = "Agent whose notes are searched")]
    pub agent: Option<String>,

    #[schemars(description = "Natural language query")]
    pub query: String,

    #[schemars(description = "Maximum number of notes to return. Defaults to 5.")]
    pub top_k: Option<usize>,
}

pub fn run(
    service: &MemoryService,
    request: RecallRequest,
    default_scope: Option<&str>,
) -> Result<String> {
    let agent = scoped(request.agent, default_scope).unwrap_or_default();
    let top_k = request.top_k.unwrap_or(service.defaults().top_k);
    to_json(&service.recall(&agent, &request.query, top_k)?)
}
