//! `st_fetch`: most recent messages of a session, newest first.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::to_json;
use crate::error::Result;
use crate::service::MemoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FetchMessagesRequest {
    #[schemars(description = "Session identifier")]
    pub session: String,

    #[schemars(description = "Maximum number of messages to return. Defaults to 10.")]
    pub limit: Option<usize>,
}

pub fn run(service: &MemoryService, request: FetchMessagesRequest) -> Result<String> {
    let limit = request.limit.unwrap_or(service.defaults().fetch_limit);
    to_json(&service.fetch_messages(&request.session, limit)?)
}
