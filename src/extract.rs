//! Text extraction collaborator for the upload path.
//!
//! Turns raw file bytes into an ordered sequence of page texts. The
//! core pipeline consumes page texts and never sees file bytes; this
//! module exists only so the CLI and HTTP upload paths can accept
//! files directly.
//!
//! Page detection for PDFs splits the extracted text on triple
//! newlines. That is a weak proxy for physical page boundaries and may
//! merge or split pages for some PDFs; it matches the quality of the
//! upstream extractor rather than fixing it.

use crate::error::PipelineError;

/// Extract page texts from file bytes, dispatching on the filename
/// extension. Supports PDF and plain text (`.txt`, `.md`).
pub fn extract_pages(bytes: &[u8], filename: &str) -> Result<Vec<String>, PipelineError> {
    let lower = filename.to_lowercase();

    let raw = if lower.ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| PipelineError::ExtractionEmpty(format!("PDF extraction failed: {}", e)))?
    } else if lower.ends_with(".txt") || lower.ends_with(".md") {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        return Err(PipelineError::InputInvalid(format!(
            "unsupported file type: {} (expected .pdf, .txt, or .md)",
            filename
        )));
    };

    let pages = split_pages(&raw);
    if pages.is_empty() {
        return Err(PipelineError::ExtractionEmpty(format!(
            "no text could be extracted from {}",
            filename
        )));
    }

    Ok(pages)
}

/// Split raw extracted text into page texts on triple newlines,
/// dropping blank pages.
fn split_pages(raw: &str) -> Vec<String> {
    raw.split("\n\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
