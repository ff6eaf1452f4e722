//! Directory ingestion: match files, extract, chunk, embed, index.
//!
//! One file's failure never aborts the batch; it is logged and recorded as a
//! `failed` outcome contributing zero chunks. Re-ingesting a directory appends
//! new chunks next to the old ones; nothing is replaced or deduplicated.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::chunker;
use super::extract::{extract_text, DocumentKind};
use crate::embedding::Embedder;
use crate::error::{MemoryError, Result};
use crate::memory::types::{Metadata, KIND_CHUNK, KIND_KEY};
use crate::memory::vector::{IndexEntry, VectorIndex};

/// Parameters of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub directory: PathBuf,
    pub agent_scope: String,
    pub namespace: String,
    /// Comma-separated glob patterns, relative to `directory`.
    pub patterns: String,
    pub max_words: usize,
    pub overlap_words: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Ingested,
    Skipped,
    Failed,
}

/// What happened to one matched file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub status: FileStatus,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate counts plus the per-file breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Distinct files matched by the patterns, whatever became of them.
    pub files: usize,
    pub chunks_added: usize,
    pub outcomes: Vec<FileOutcome>,
}

impl IngestReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

pub fn ingest_directory(
    index: &VectorIndex,
    embedder: &Embedder,
    options: &IngestOptions,
) -> Result<IngestReport> {
    let directory = validate(options)?;
    let files = match_files(directory, &options.patterns)?;

    tracing::info!(
        directory = %directory.display(),
        agent_scope = %options.agent_scope,
        namespace = %options.namespace,
        matched = files.len(),
        "ingestion started"
    );

    // A model that cannot load fails the whole run rather than every file.
    // Once loaded, embedding errors belong to the file that caused them.
    if !files.is_empty() {
        embedder.provider()?;
    }

    let mut outcomes = Vec::with_capacity(files.len());
    for path in &files {
        let path_str = path.display().to_string();
        let outcome = match ingest_file(index, embedder, options, path, &path_str) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(path = %path_str, error = %e, "file ingestion failed");
                FileOutcome {
                    path: path_str,
                    status: FileStatus::Failed,
                    chunks: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    let report = IngestReport {
        files: files.len(),
        chunks_added: outcomes.iter().map(|o| o.chunks).sum(),
        outcomes,
    };
    tracing::info!(
        files = report.files,
        chunks_added = report.chunks_added,
        failed = report.count(FileStatus::Failed),
        "ingestion finished"
    );
    Ok(report)
}

/// Checks directory, scope and chunking parameters without touching the index.
pub fn validate(options: &IngestOptions) -> Result<&Path> {
    let directory = options.directory.as_path();
    if directory.as_os_str().is_empty() {
        return Err(MemoryError::config("directory is required"));
    }
    if !directory.exists() {
        return Err(MemoryError::config(format!(
            "directory does not exist: {}",
            directory.display()
        )));
    }
    if !directory.is_dir() {
        return Err(MemoryError::config(format!(
            "not a directory: {}",
            directory.display()
        )));
    }
    if options.agent_scope.trim().is_empty() {
        return Err(MemoryError::config("agent_scope must not be empty"));
    }
    if options.namespace.trim().is_empty() {
        return Err(MemoryError::config("namespace must not be empty"));
    }
    chunker::validate(options.max_words, options.overlap_words)?;
    Ok(directory)
}

/// Regular files under `directory` matching any pattern, deduplicated and sorted.
pub fn match_files(directory: &Path, patterns: &str) -> Result<Vec<PathBuf>> {
    let base = directory.to_str().ok_or_else(|| {
        MemoryError::config(format!("directory is not valid UTF-8: {}", directory.display()))
    })?;
    let base = glob::Pattern::escape(base.trim_end_matches('/'));

    let mut files = BTreeSet::new();
    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let full = format!("{base}/{pattern}");
        let entries = glob::glob(&full)
            .map_err(|e| MemoryError::config(format!("invalid pattern {pattern:?}: {e}")))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    files.insert(path);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "unreadable path while matching"),
            }
        }
    }
    Ok(files.into_iter().collect())
}

fn ingest_file(
    index: &VectorIndex,
    embedder: &Embedder,
    options: &IngestOptions,
    path: &Path,
    path_str: &str,
) -> Result<FileOutcome> {
    let skipped = |reason: &str| {
        tracing::debug!(path = %path_str, reason, "file skipped");
        Ok(FileOutcome {
            path: path_str.to_string(),
            status: FileStatus::Skipped,
            chunks: 0,
            error: Some(reason.to_string()),
        })
    };

    let Some(kind) = DocumentKind::from_path(path) else {
        return skipped("unsupported extension");
    };
    let text = extract_text(path, kind)?;
    if text.trim().is_empty() {
        return skipped("no extractable text");
    }

    let chunks = chunker::chunk_words(&text, options.max_words, options.overlap_words)?;
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let embeddings = embedder.embed_batch(&refs)?;

    let batch = uuid::Uuid::now_v7();
    let entries: Vec<IndexEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (text, embedding))| IndexEntry {
            id: format!("{path_str}:{i}:{batch}"),
            text,
            embedding,
            metadata: chunk_metadata(path_str, options, i),
        })
        .collect();

    let written = index.add(&entries)?;
    tracing::debug!(path = %path_str, chunks = written, "file ingested");

    Ok(FileOutcome {
        path: path_str.to_string(),
        status: FileStatus::Ingested,
        chunks: written,
        error: None,
    })
}

fn chunk_metadata(path: &str, options: &IngestOptions, chunk_index: usize) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("path".into(), Value::String(path.to_string()));
    metadata.insert("agent_scope".into(), Value::String(options.agent_scope.clone()));
    metadata.insert("namespace".into(), Value::String(options.namespace.clone()));
    metadata.insert("chunk".into(), Value::from(chunk_index as i64));
    metadata.insert(KIND_KEY.into(), Value::String(KIND_CHUNK.into()));
    metadata
}
