use crate::config::{Endpoints, HarvestConfig, HarvestScope, VenueSpec};
use crate::fetcher::{Fetcher, PageResponse};
use crate::filter::MatchScope;
use crate::harvest::HarvestError;
use crate::sources::discover::{HrefMatcher, discover_by_href};
use crate::sources::{
    CandidateLink, Listing, PaperSource, ResolvedDocument, dblp_listings, resolve_direct,
};
use crate::storage::PersistMode;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

/// ACM DOIs as linked from dblp, e.g. `https://doi.org/10.1145/3548606.3560001`.
static ACM_DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"doi\.org/(10\.1145/\d{7}\.\d{7})").unwrap());

/// dblp listing whose DOIs map straight onto ACM's PDF endpoint.
pub struct DoiDirectSource {
    venue: VenueSpec,
    dblp_base: String,
    matcher: HrefMatcher,
}

impl DoiDirectSource {
    pub fn new(venue: VenueSpec, endpoints: &Endpoints) -> Self {
        let template = format!("{}/doi/pdf/${{1}}", endpoints.acm_base);
        Self {
            venue,
            dblp_base: endpoints.dblp_base.clone(),
            matcher: HrefMatcher::new(&ACM_DOI, template),
        }
    }
}

#[async_trait]
impl PaperSource for DoiDirectSource {
    fn venue(&self) -> &VenueSpec {
        &self.venue
    }

    fn listings(&self, scope: &HarvestScope) -> Vec<Listing> {
        dblp_listings(&self.dblp_base, &self.venue.id, scope)
    }

    fn discover(&self, listing: &Listing, page: &PageResponse) -> Vec<CandidateLink> {
        discover_by_href(&page.body_utf8, &self.matcher, &listing.context)
    }

    async fn resolve(
        &self,
        candidate: CandidateLink,
        _fetcher: &Fetcher,
    ) -> Result<ResolvedDocument, HarvestError> {
        resolve_direct(candidate)
    }

    fn match_scope(&self) -> MatchScope {
        MatchScope::DocumentText
    }

    fn persist_mode(&self) -> PersistMode {
        PersistMode::Overwrite
    }

    fn politeness_delay(&self, config: &HarvestConfig) -> Duration {
        config.document_delay
    }
}
