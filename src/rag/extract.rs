//! Text extraction for ingestible documents, dispatched by file extension.

use std::path::Path;

use crate::error::{MemoryError, Result};

/// How a file's text is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Kind for `path` by (case-insensitive) extension, or `None` if unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" | "markdown" => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Extract the text of `path` according to `kind`.
pub fn extract_text(path: &Path, kind: DocumentKind) -> Result<String> {
    match kind {
        DocumentKind::Pdf => read_pdf(path),
        DocumentKind::PlainText => read_text(path),
    }
}

/// Page-by-page PDF text, pages joined with newlines. Pages that fail to
/// extract are skipped; only an unreadable document is an error.
fn read_pdf(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path).map_err(|e| extraction(path, e))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                tracing::debug!(path = %path.display(), page = page_number, error = %e, "skipping unreadable page");
            }
        }
    }
    Ok(pages.join("\n"))
}

/// UTF-8 text with undecodable byte sequences dropped.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| extraction(path, e))?;
    Ok(decode_utf8_dropping_invalid(&bytes))
}

fn decode_utf8_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

fn extraction(path: &Path, e: impl std::fmt::Display) -> MemoryError {
    MemoryError::Extraction {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
