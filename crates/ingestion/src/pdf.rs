//! PDF text extraction module
//!
//! Extracts text content from PDF files using lopdf.

use crate::errors::IngestionError;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Extract text content from a PDF file on disk
pub fn extract_text_from_pdf(path: &Path) -> Result<String, IngestionError> {
    let doc = Document::load(path).map_err(|e| IngestionError::PdfParseError {
        message: format!("Failed to load {}: {}", path.display(), e),
    })?;

    Ok(extract_document_text(&doc))
}

/// Extract text content from PDF bytes
pub fn extract_text(bytes: &[u8]) -> Result<String, IngestionError> {
    let doc = Document::load_mem(bytes).map_err(|e| IngestionError::PdfParseError {
        message: format!("Failed to load PDF: {}", e),
    })?;

    Ok(extract_document_text(&doc))
}

/// Join page texts with newlines, skipping pages that fail. A document without
/// any text yields an empty string.
fn extract_document_text(doc: &Document) -> String {
    let pages = doc.get_pages();

    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut page_texts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => page_texts.push(clean_text(&page_text)),
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let text = page_texts
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    debug!(text_len = text.len(), "Text extraction complete");

    text
}

/// Collapse whitespace and normalize typographic quotes
fn clean_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{FEFF}', "")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}
