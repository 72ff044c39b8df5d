use crate::config::{Endpoints, HarvestConfig, HarvestScope, VenueSpec};
use crate::extractor::FetchedContent;
use crate::fetcher::{Fetcher, PageResponse};
use crate::filter::MatchScope;
use crate::harvest::HarvestError;
use crate::sources::discover::{HrefMatcher, discover_by_href};
use crate::sources::landing::primary_resource;
use crate::sources::{CandidateLink, Listing, PaperSource, ResolvedDocument, dblp_listings};
use crate::storage::{PersistMode, naming};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// IEEE DOIs as linked from dblp; the trailing seven digits are the article number.
static IEEE_DOI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"doi\.org/10\.1109/.*(\d{7})").unwrap());

/// dblp listing whose DOIs resolve through IEEE's stamp landing page.
pub struct StampIndirectSource {
    venue: VenueSpec,
    dblp_base: String,
    matcher: HrefMatcher,
}

impl StampIndirectSource {
    pub fn new(venue: VenueSpec, endpoints: &Endpoints) -> Self {
        let template = format!("{}/stamp/stamp.jsp?tp=&arnumber=${{1}}", endpoints.ieee_base);
        Self {
            venue,
            dblp_base: endpoints.dblp_base.clone(),
            matcher: HrefMatcher::new(&IEEE_DOI, template),
        }
    }
}

#[async_trait]
impl PaperSource for StampIndirectSource {
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
        fetcher: &Fetcher,
    ) -> Result<ResolvedDocument, HarvestError> {
        let landing = match fetcher.fetch_page(&candidate.url).await {
            Ok(page) => page,
            Err(err) => {
                return Err(HarvestError::ResolutionFailed {
                    url: candidate.url,
                    reason: format!("landing page: {err}"),
                });
            }
        };

        match primary_resource(&landing.body_utf8, &landing.url_final) {
            Ok(document_url) => {
                debug!(landing = %candidate.url, document = %document_url, "resolved landing page");
                Ok(ResolvedDocument {
                    url: document_url.into(),
                    candidate,
                })
            }
            Err(err) => Err(HarvestError::ResolutionFailed {
                url: candidate.url,
                reason: err.to_string(),
            }),
        }
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

    /// The paper's title line, or the article number when no title was found.
    fn document_stem(&self, document: &ResolvedDocument, content: Option<&FetchedContent>) -> String {
        content
            .and_then(FetchedContent::title)
            .and_then(|title| naming::title_line_stem(&title))
            .or_else(|| article_number(&document.candidate.url))
            .or_else(|| naming::url_tail(&document.url))
            .unwrap_or_else(|| "document".to_string())
    }
}

fn article_number(stamp_url: &str) -> Option<String> {
    Url::parse(stamp_url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "arnumber")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
