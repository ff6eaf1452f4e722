//! `st_store`: append a message to a session transcript.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::memory::types::Role;
use crate::service::MemoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StoreMessageRequest {
    #[schemars(description = "Session (conversation or run) identifier")]
    pub session: String,

    #[schemars(description = "Agent that authored the message")]
    pub agent: String,

    #[schemars(description = "Message role: 'user', 'assistant', 'system' or 'note'. Defaults to 'note'.")]
    pub role: Option<String>,

    #[schemars(description = "Message body")]
    pub content: String,
}

pub fn run(service: &MemoryService, request: StoreMessageRequest) -> Result<String> {
    let role = match request.role.as_deref() {
        None | Some("") => Role::default(),
        Some(raw) => raw.parse::<Role>().map_err(MemoryError::Configuration)?,
    };
    service.store_message(&request.session, &request.agent, role, &request.content)?;
    Ok("stored".into())
}
