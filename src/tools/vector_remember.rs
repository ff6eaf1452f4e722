//! `vector_remember`: save a long-term note for an agent.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::scoped;
use crate::error::Result;
use crate::service::MemoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberRequest {
    #[schemars(description = "Agent that owns the note, e.g. 'manager' or 'qa_engineer'")]
    pub agent: Option<String>,

    #[schemars(description = "Text of the note")]
    pub text: String,

    #[schemars(description = "Optional tags stored with the note")]
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn run(
    service: &MemoryService,
    request: RememberRequest,
    default_scope: Option<&str>,
) -> Result<String> {
    let agent = scoped(request.agent, default_scope).unwrap_or_default();
    service.remember(&agent, &request.text, &request.tags)?;
    Ok("saved".into())
}
