//! `crew-memory query`: search ingested documents from the terminal.

use anyhow::Result;
use std::sync::Arc;

use crate::config::CrewMemoryConfig;
use crate::rag::query::ScopeFilters;
use crate::service::MemoryService;

#[derive(Debug, clap::Args)]
pub struct QueryArgs {
    /// Natural language query
    pub query: String,
    /// Maximum number of chunks to return
    #[arg(long)]
    pub top_k: Option<usize>,
    /// Only return chunks ingested under this agent scope
    #[arg(long)]
    pub agent_scope: Option<String>,
    /// Only return chunks ingested under this namespace
    #[arg(long)]
    pub namespace: Option<String>,
}

pub async fn query(config: &CrewMemoryConfig, args: QueryArgs) -> Result<()> {
    let service = Arc::new(MemoryService::new(config));
    let top_k = args.top_k.unwrap_or(config.retrieval.default_top_k);
    let scopes = ScopeFilters {
        agent_scope: args.agent_scope,
        namespace: args.namespace,
        agent: None,
    };
    let text = args.query;

    let hits = tokio::task::spawn_blocking(move || service.query(&text, top_k, &scopes)).await??;

    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.text.chars().take(160).collect();
        let ellipsis = if hit.text.chars().count() > 160 { "..." } else { "" };
        println!(
            "  {}. {} #{} [{}/{}] (score: {:.4})",
            i + 1,
            hit.path.as_deref().unwrap_or("?"),
            hit.chunk.unwrap_or_default(),
            hit.agent_scope.as_deref().unwrap_or("-"),
            hit.namespace.as_deref().unwrap_or("-"),
            hit.score
        );
        println!("     {preview}{ellipsis}\n");
    }
    Ok(())
}
