//! Source document loading.
//!
//! `.txt` and `.md` files are read as UTF-8; `.pdf` files are extracted
//! page by page when the `pdf` feature is enabled.

use crate::error::{PodcastError, Result};
use std::path::Path;
#[cfg(feature = "pdf")]
use std::time::Duration;

#[cfg(feature = "pdf")]
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Kind of document, from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Pdf,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" | "md" | "markdown" => Ok(DocumentKind::PlainText),
            "pdf" => Ok(DocumentKind::Pdf),
            other => Err(document_error(
                path,
                format!("unsupported document type '.{other}' (expected .pdf, .txt or .md)"),
            )),
        }
    }
}

/// Load the full text of `path`.
///
/// Fails when the file is missing, unsupported, or yields no text.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub async fn load_text(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(document_error(path, "file not found"));
    }

    let text = match DocumentKind::from_path(path)? {
        DocumentKind::PlainText => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| document_error(path, e.to_string()))?,
        DocumentKind::Pdf => load_pdf(path).await?,
    };

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(document_error(path, "no text found"));
    }
    tracing::info!(chars = text.chars().count(), "Loaded document");
    Ok(text)
}

#[cfg(feature = "pdf")]
async fn load_pdf(path: &Path) -> Result<String> {
    let owned = path.to_path_buf();
    let pages = tokio::time::timeout(
        EXTRACTION_TIMEOUT,
        tokio::task::spawn_blocking(move || extract_pages(&owned)),
    )
    .await
    .map_err(|_| document_error(path, "PDF extraction timed out"))?
    .map_err(|e| document_error(path, format!("task join error: {e}")))??;

    tracing::debug!(pages = pages.len(), "PDF text extraction complete");
    Ok(pages.join("\n\n"))
}

#[cfg(not(feature = "pdf"))]
async fn load_pdf(path: &Path) -> Result<String> {
    Err(document_error(
        path,
        "PDF support is not compiled in (enable the `pdf` feature)",
    ))
}

/// Text of every non-blank page, in page order.
#[cfg(feature = "pdf")]
fn extract_pages(path: &Path) -> Result<Vec<String>> {
    use pdf_oxide::PdfDocument;

    let mut doc = PdfDocument::open(path)
        .map_err(|e| document_error(path, format!("failed to parse PDF: {e}")))?;
    let page_count = doc
        .page_count()
        .map_err(|e| document_error(path, format!("failed to read page count: {e}")))?;

    let mut pages = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        match doc.extract_text(page_index) {
            Ok(text) if !text.trim().is_empty() => pages.push(text),
            Ok(_) => {}
            Err(e) => tracing::warn!(page = page_index + 1, error = %e, "Skipping unreadable page"),
        }
    }
    Ok(pages)
}

/// Collapse runs of blank lines and trailing spaces left by extraction.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}

fn document_error(path: &Path, message: impl Into<String>) -> PodcastError {
    PodcastError::Document {
        path: path.display().to_string(),
        message: message.into(),
    }
}
