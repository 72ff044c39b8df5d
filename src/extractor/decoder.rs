//! Paged-document decoding.
//!
//! The harvester only needs two things from a PDF: how many pages it has and
//! the text of a few leading pages. `DocumentDecoder` is that seam;
//! `LopdfDecoder` implements it on top of `lopdf`.

use lopdf::Document;
use std::panic;
use thiserror::Error;
use tracing::debug;

/// Headers may be preceded by junk; readers accept it within the first 1KB.
const HEADER_SEARCH_BYTES: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DecodeError(pub String);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedDocument {
    pub page_count: usize,
    /// Text of the leading pages, at most the requested window.
    pub pages: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], window: usize) -> Result<DecodedDocument, DecodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfDecoder;

impl DocumentDecoder for LopdfDecoder {
    fn decode(&self, bytes: &[u8], window: usize) -> Result<DecodedDocument, DecodeError> {
        if !has_pdf_header(bytes) {
            return Err(DecodeError("missing %PDF- header".to_string()));
        }

        // lopdf can panic on some malformed cross-reference tables.
        panic::catch_unwind(|| decode_with_lopdf(bytes, window))
            .unwrap_or_else(|_| Err(DecodeError("pdf parser panicked".to_string())))
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_SEARCH_BYTES)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

fn decode_with_lopdf(bytes: &[u8], window: usize) -> Result<DecodedDocument, DecodeError> {
    let document = Document::load_mem(bytes).map_err(|e| DecodeError(e.to_string()))?;
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(DecodeError("document has no pages".to_string()));
    }

    let texts = pages
        .keys()
        .take(window)
        .map(|&number| {
            document.extract_text(&[number]).unwrap_or_else(|e| {
                debug!(page = number, "no extractable text: {}", e);
                String::new()
            })
        })
        .collect();

    Ok(DecodedDocument {
        page_count: pages.len(),
        pages: texts,
    })
}
