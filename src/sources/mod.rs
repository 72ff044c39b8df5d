//! Venue-specific discovery and resolution.
//!
//! Each venue family implements `PaperSource`: how listing URLs are built,
//! how candidates are found in a listing, how a candidate becomes a
//! fetchable document, and the filtering/persistence capabilities the
//! harvester should apply to it.

pub mod article;
pub mod discover;
pub mod doi;
pub mod landing;
pub mod model;
pub mod stamp;

pub use article::StructuredArticleSource;
pub use doi::DoiDirectSource;
pub use model::{CandidateLink, Listing, PaperRecord, ResolvedDocument, SourceContext};
pub use stamp::StampIndirectSource;

use crate::config::{Endpoints, HarvestConfig, HarvestScope, SourceFamily, VenueSpec};
use crate::extractor::FetchedContent;
use crate::fetcher::{Fetcher, PageResponse};
use crate::filter::MatchScope;
use crate::harvest::HarvestError;
use crate::storage::{PersistMode, naming};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[async_trait]
pub trait PaperSource: Send + Sync {
    fn venue(&self) -> &VenueSpec;

    /// Listing pages for the cross product of the scope parameters.
    fn listings(&self, scope: &HarvestScope) -> Vec<Listing>;

    /// Candidates on one listing page, deduplicated, in document order.
    fn discover(&self, listing: &Listing, page: &PageResponse) -> Vec<CandidateLink>;

    /// Turn a candidate into a document URL, fetching a landing page if the
    /// source needs one.
    async fn resolve(
        &self,
        candidate: CandidateLink,
        fetcher: &Fetcher,
    ) -> Result<ResolvedDocument, HarvestError>;

    fn match_scope(&self) -> MatchScope;

    fn persist_mode(&self) -> PersistMode;

    fn politeness_delay(&self, config: &HarvestConfig) -> Duration;

    fn destination(&self, save_root: &Path, _context: &SourceContext) -> PathBuf {
        save_root.to_path_buf()
    }

    /// File name without extension.
    fn document_stem(&self, document: &ResolvedDocument, _content: Option<&FetchedContent>) -> String {
        naming::url_tail(&document.url).unwrap_or_else(|| "document".to_string())
    }
}

pub fn build_source(venue: &VenueSpec, endpoints: &Endpoints) -> Box<dyn PaperSource> {
    match venue.family {
        SourceFamily::DoiDirect => Box::new(DoiDirectSource::new(venue.clone(), endpoints)),
        SourceFamily::StampIndirect => Box::new(StampIndirectSource::new(venue.clone(), endpoints)),
        SourceFamily::StructuredArticle => {
            Box::new(StructuredArticleSource::new(venue.clone(), endpoints))
        }
    }
}

/// `<dblp>/<venue>/<venue><year>.html` for every year in scope.
pub(crate) fn dblp_listings(dblp_base: &str, venue: &str, scope: &HarvestScope) -> Vec<Listing> {
    scope
        .years
        .iter()
        .map(|year| Listing {
            url: format!("{dblp_base}/{venue}/{venue}{year}.html"),
            context: SourceContext {
                venue: venue.to_string(),
                year: year.clone(),
                term: None,
            },
        })
        .collect()
}

/// Direct resolution: the candidate URL is already the document.
pub(crate) fn resolve_direct(candidate: CandidateLink) -> Result<ResolvedDocument, HarvestError> {
    if let Err(err) = Url::parse(&candidate.url) {
        return Err(HarvestError::ResolutionFailed {
            url: candidate.url,
            reason: format!("malformed url: {err}"),
        });
    }
    Ok(ResolvedDocument {
        url: candidate.url.clone(),
        candidate,
    })
}
