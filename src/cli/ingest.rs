//! `crew-memory ingest`: index a document directory from the terminal.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CrewMemoryConfig;
use crate::rag::ingest::{FileStatus, IngestOptions};
use crate::service::MemoryService;

/// Flags left out fall back to the `[ingest]` config section.
#[derive(Debug, Default, clap::Args)]
pub struct IngestArgs {
    /// Directory containing the documents
    pub directory: PathBuf,
    /// Agent scope the chunks belong to
    #[arg(long)]
    pub agent_scope: Option<String>,
    /// Namespace, e.g. a feature or project name
    #[arg(long)]
    pub namespace: Option<String>,
    /// Comma-separated glob patterns
    #[arg(long)]
    pub patterns: Option<String>,
    /// Words per chunk
    #[arg(long)]
    pub max_words: Option<usize>,
    /// Words repeated between consecutive chunks
    #[arg(long)]
    pub overlap_words: Option<usize>,
}

impl IngestArgs {
    pub fn into_options(self, config: &CrewMemoryConfig) -> IngestOptions {
        let defaults = &config.ingest;
        IngestOptions {
            directory: self.directory,
            agent_scope: self.agent_scope.unwrap_or_else(|| defaults.agent_scope.clone()),
            namespace: self.namespace.unwrap_or_else(|| defaults.namespace.clone()),
            patterns: self.patterns.unwrap_or_else(|| defaults.patterns.clone()),
            max_words: self.max_words.unwrap_or(defaults.max_words),
            overlap_words: self.overlap_words.unwrap_or(defaults.overlap_words),
        }
    }
}

pub async fn ingest(config: &CrewMemoryConfig, args: IngestArgs) -> Result<()> {
    let options = args.into_options(config);
    let service = Arc::new(MemoryService::new(config));

    println!(
        "Ingesting {} (agent_scope={}, namespace={}, patterns={})",
        options.directory.display(),
        options.agent_scope,
        options.namespace,
        options.patterns
    );

    let report = tokio::task::spawn_blocking(move || service.ingest(&options)).await??;

    for outcome in &report.outcomes {
        let status = match outcome.status {
            FileStatus::Ingested => "ok",
            FileStatus::Skipped => "skip",
            FileStatus::Failed => "FAIL",
        };
        match &outcome.error {
            Some(reason) => println!("  [{status:>4}] {} ({reason})", outcome.path),
            None => println!("  [{status:>4}] {} ({} chunks)", outcome.path, outcome.chunks),
        }
    }

    println!(
        "\n{} file(s) matched, {} chunk(s) added, {} failed",
        report.files,
        report.chunks_added,
        report.count(FileStatus::Failed)
    );
    Ok(())
}
