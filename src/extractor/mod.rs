pub mod decoder;

pub use decoder::{DecodeError, DecodedDocument, DocumentDecoder, LopdfDecoder};

use crate::storage::naming::replace_unsafe_chars;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unreadable document: {0}")]
    Unreadable(#[from] DecodeError),

    #[error("too short: {pages} pages (needs more than {min_pages})")]
    TooShort { pages: usize, min_pages: usize },
}

/// A decoded document that passed the page-count threshold.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Bytes,
    pub page_count: usize,
    /// Concatenated text of the leading pages, searched by the keyword filter.
    pub text_window: String,
    pub first_page: String,
}

impl FetchedContent {
    /// First non-empty line of the first page, made safe for filenames.
    pub fn title(&self) -> Option<String> {
        self.first_page
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(replace_unsafe_chars)
    }
}

pub struct TextExtractor {
    decoder: Box<dyn DocumentDecoder>,
    min_pages: usize,
    window_pages: usize,
}

impl TextExtractor {
    pub fn new(decoder: Box<dyn DocumentDecoder>, min_pages: usize, window_pages: usize) -> Self {
        Self {
            decoder,
            min_pages,
            window_pages,
        }
    }

    pub fn with_lopdf(min_pages: usize, window_pages: usize) -> Self {
        Self::new(Box::new(LopdfDecoder), min_pages, window_pages)
    }

    /// Decode `bytes`, reject short documents, collect the text window.
    ///
    /// Documents with `min_pages` pages or fewer are usually abstracts or
    /// keynote placeholders rather than papers.
    pub fn extract(&self, bytes: Bytes) -> Result<FetchedContent, ExtractError> {
        let decoded = self.decoder.decode(&bytes, self.window_pages)?;

        if decoded.page_count <= self.min_pages {
            return Err(ExtractError::TooShort {
                pages: decoded.page_count,
                min_pages: self.min_pages,
            });
        }

        let first_page = decoded.pages.first().cloned().unwrap_or_default();
        let text_window = decoded
            .pages
            .iter()
            .take(self.window_pages)
            .map(String::as_str)
            .collect::<String>();

        Ok(FetchedContent {
            bytes,
            page_count: decoded.page_count,
            text_window,
            first_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::decoder::MockDocumentDecoder;
    use mockall::predicate::eq;

    fn decoded(page_count: usize, pages: &[&str]) -> DecodedDocument {
        DecodedDocument {
            page_count,
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn concatenates_window_pages() {
        let mut decoder = MockDocumentDecoder::new();
        decoder
            .expect_decode()
            .with(mockall::predicate::always(), eq(3))
            .returning(|_, _| {
                Ok(decoded(
                    12,
                    &["Fuzzing Kernels\nAlice\n", "Intro ", "Background"],
                ))
            });

        let extractor = TextExtractor::new(Box::new(decoder), 6, 3);
        let content = extractor.extract(Bytes::from_static(b"%PDF-1.7")).unwrap();

        assert_eq!(content.page_count, 12);
        assert_eq!(content.text_window, "Fuzzing Kernels\nAlice\nIntro Background");
        assert_eq!(content.title().as_deref(), Some("Fuzzing Kernels"));
    }

    #[test]
    fn threshold_is_inclusive() {
        for (pages, short) in [(1, true), (6, true), (7, false)] {
            let mut decoder = MockDocumentDecoder::new();
            decoder
                .expect_decode()
                .returning(move |_, _| Ok(decoded(pages, &["text"])));

            let extractor = TextExtractor::new(Box::new(decoder), 6, 3);
            let result = extractor.extract(Bytes::from_static(b"%PDF-1.7"));
            assert_eq!(
                matches!(result, Err(ExtractError::TooShort { .. })),
                short,
                "{pages} pages"
            );
        }
    }

    #[test]
    fn custom_threshold() {
        let mut decoder = MockDocumentDecoder::new();
        decoder
            .expect_decode()
            .returning(|_, _| Ok(decoded(3, &["a", "b", "c"])));

        let extractor = TextExtractor::new(Box::new(decoder), 2, 3);
        assert!(extractor.extract(Bytes::new()).is_ok());
    }

    #[test]
    fn decode_failure_is_unreadable() {
        let mut decoder = MockDocumentDecoder::new();
        decoder
            .expect_decode()
            .returning(|_, _| Err(DecodeError("bad xref".to_string())));

        let extractor = TextExtractor::new(Box::new(decoder), 6, 3);
        assert_eq!(
            extractor.extract(Bytes::new()).unwrap_err(),
            ExtractError::Unreadable(DecodeError("bad xref".to_string()))
        );
    }

    #[test]
    fn short_payloads_are_unreadable_with_lopdf() {
        let extractor = TextExtractor::with_lopdf(6, 3);
        for payload in [&b""[..], b"%", b"%PDF", b"%PDF-1."] {
            let result = extractor.extract(Bytes::copy_from_slice(payload));
            assert!(matches!(result, Err(ExtractError::Unreadable(_))));
        }
    }

    #[test]
    fn title_replaces_unsafe_characters() {
        let content = FetchedContent {
            bytes: Bytes::new(),
            page_count: 10,
            text_window: String::new(),
            first_page: "\n  SoK: Attacks/Defenses?\nBob".to_string(),
        };
        assert_eq!(content.title().as_deref(), Some("SoK_ Attacks_Defenses_"));
    }

    #[test]
    fn blank_first_page_has_no_title() {
        let content = FetchedContent {
            bytes: Bytes::new(),
            page_count: 10,
            text_window: String::new(),
            first_page: " \n\n".to_string(),
        };
        assert_eq!(content.title(), None);
    }
}
