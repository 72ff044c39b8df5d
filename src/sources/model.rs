use std::fmt;
use std::path::PathBuf;

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub venue: String,
    pub year: String,
    pub term: Option<String>,
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.term {
            Some(term) => write!(f, "{} {} ({})", self.venue, self.year, term),
            None => write!(f, "{} {}", self.venue, self.year),
        }
    }
}

/// One listing page to scan for candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub url: String,
    pub context: SourceContext,
}

/// Metadata published alongside a paper on a structured listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperRecord {
    pub title: String,
    pub detail_url: String,
    pub authors: Option<String>,
    pub abstract_text: Option<String>,
    pub pdf_url: Option<String>,
    pub year: String,
    pub term: String,
    /// Set once the PDF is on disk.
    pub local_path: Option<PathBuf>,
}

/// A paper reference found on a listing page, not yet known to be fetchable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    /// The `href` exactly as found in the markup.
    pub reference: String,
    /// The reference after the venue rewrite; unique within one listing.
    pub url: String,
    pub context: SourceContext,
    pub record: Option<PaperRecord>,
}

/// A candidate whose document location is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub url: String,
    pub candidate: CandidateLink,
}
