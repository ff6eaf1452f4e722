//! `rag_ingest`: chunk and index every matching document in a directory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{scoped, to_json};
use crate::error::Result;
use crate::rag::ingest::IngestOptions;
use crate::service::MemoryService;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestRequest {
    #[schemars(description = "Directory containing the documents")]
    pub directory: String,

    #[schemars(description = "Agent scope the chunks belong to. Defaults to 'shared'.")]
    pub agent_scope: Option<String>,

    #[schemars(description = "Namespace, e.g. a feature or project name. Defaults to 'default'.")]
    pub namespace: Option<String>,

    #[schemars(description = "Comma-separated glob patterns. Defaults to '*.pdf,*.txt'.")]
    pub patterns: Option<String>,

    #[schemars(description = "Words per chunk. Defaults to 300.")]
    pub max_words: Option<usize>,

    #[schemars(description = "Words repeated between consecutive chunks. Defaults to 50.")]
    pub overlap_words: Option<usize>,
}

impl IngestRequest {
    /// Fill omitted fields: the tool's default scope first, then configured defaults.
    pub fn into_options(self, service: &MemoryService, default_scope: Option<&str>) -> IngestOptions {
        let defaults = service.defaults();
        IngestOptions {
            directory: self.directory.into(),
            agent_scope: scoped(self.agent_scope, default_scope)
                .unwrap_or_else(|| defaults.agent_scope.clone()),
            namespace: self
                .namespace
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| defaults.namespace.clone()),
            patterns: self
                .patterns
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| defaults.patterns.clone()),
            max_words: self.max_words.unwrap_or(defaults.max_words),
            overlap_words: self.overlap_words.unwrap_or(defaults.overlap_words),
        }
    }
}

pub fn run(
    service: &MemoryService,
    request: IngestRequest,
    default_scope: Option<&str>,
) -> Result<String> {
    let options = request.into_options(service, default_scope);
    to_json(&service.ingest(&options)?)
}
