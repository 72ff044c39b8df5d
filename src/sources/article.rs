use crate::config::{Endpoints, HarvestConfig, HarvestScope, VenueSpec};
use crate::extractor::FetchedContent;
use crate::fetcher::{Fetcher, PageResponse};
use crate::filter::MatchScope;
use crate::harvest::HarvestError;
use crate::sources::discover::dedup_by_url;
use crate::sources::{
    CandidateLink, Listing, PaperRecord, PaperSource, ResolvedDocument, SourceContext,
    resolve_direct,
};
use crate::storage::{PersistMode, naming};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

static ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.node-paper").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2 a").unwrap());
static AUTHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".field-name-field-paper-people-text").unwrap());
static ABSTRACT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".field-name-field-paper-description-long").unwrap());
static PDF_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.usenix-schedule-media.pdf a").unwrap());

/// USENIX accepted-papers pages: one `article` block per paper carrying its
/// metadata and, once published, a PDF link.
pub struct StructuredArticleSource {
    venue: VenueSpec,
    base: String,
}

impl StructuredArticleSource {
    pub fn new(venue: VenueSpec, endpoints: &Endpoints) -> Self {
        Self {
            venue,
            base: endpoints.usenix_base.clone(),
        }
    }

    pub fn listing_url(&self, year: &str, term: &str) -> String {
        format!(
            "{}/conference/usenixsecurity{}/{}-accepted-papers",
            self.base, year, term
        )
    }
}

#[async_trait]
impl PaperSource for StructuredArticleSource {
    fn venue(&self) -> &VenueSpec {
        &self.venue
    }

    fn listings(&self, scope: &HarvestScope) -> Vec<Listing> {
        scope
            .years
            .iter()
            .flat_map(|year| {
                scope.terms.iter().map(move |term| Listing {
                    url: self.listing_url(year, term),
                    context: SourceContext {
                        venue: self.venue.id.clone(),
                        year: year.clone(),
                        term: Some(term.clone()),
                    },
                })
            })
            .collect()
    }

    fn discover(&self, listing: &Listing, page: &PageResponse) -> Vec<CandidateLink> {
        let document = Html::parse_document(&page.body_utf8);
        let candidates = document
            .select(&ARTICLE)
            .filter_map(|article| parse_article(article, &page.url_final, &listing.context));
        dedup_by_url(candidates)
    }

    async fn resolve(
        &self,
        candidate: CandidateLink,
        _fetcher: &Fetcher,
    ) -> Result<ResolvedDocument, HarvestError> {
        match candidate.record.as_ref().and_then(|r| r.pdf_url.clone()) {
            Some(pdf_url) => {
                let mut candidate = candidate;
                candidate.url = pdf_url;
                resolve_direct(candidate)
            }
            None => Err(HarvestError::ResolutionFailed {
                url: candidate.url,
                reason: "no PDF link available".to_string(),
            }),
        }
    }

    fn match_scope(&self) -> MatchScope {
        MatchScope::Abstract
    }

    fn persist_mode(&self) -> PersistMode {
        PersistMode::SkipExisting
    }

    fn politeness_delay(&self, config: &HarvestConfig) -> Duration {
        config.metadata_delay
    }

    /// `<root>/<year>/<term>`
    fn destination(&self, save_root: &Path, context: &SourceContext) -> PathBuf {
        let mut dir = save_root.join(&context.year);
        if let Some(term) = &context.term {
            dir.push(term);
        }
        dir
    }

    fn document_stem(
        &self,
        document: &ResolvedDocument,
        _content: Option<&FetchedContent>,
    ) -> String {
        document
            .candidate
            .record
            .as_ref()
            .and_then(|record| naming::file_stem(&record.title))
            .or_else(|| naming::url_tail(&document.url))
            .unwrap_or_else(|| "paper".to_string())
    }
}

fn parse_article(
    article: ElementRef<'_>,
    page_url: &Url,
    context: &SourceContext,
) -> Option<CandidateLink> {
    let title_anchor = article.select(&TITLE).next()?;
    let href = title_anchor.value().attr("href")?;
    let detail_url = page_url.join(href).ok()?.to_string();
    let title = joined_text(title_anchor)?;

    let pdf_url = article
        .select(&PDF_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .map(String::from);

    let record = PaperRecord {
        title,
        detail_url: detail_url.clone(),
        authors: article.select(&AUTHORS).next().and_then(joined_text),
        abstract_text: article.select(&ABSTRACT).next().and_then(joined_text),
        pdf_url,
        year: context.year.trim().to_string(),
        term: context.term.clone().unwrap_or_default().trim().to_string(),
        local_path: None,
    };

    Some(CandidateLink {
        reference: href.to_string(),
        url: detail_url,
        context: context.clone(),
        record: Some(record),
    })
}

/// All descendant text with whitespace runs collapsed; `None` when empty.
fn joined_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}
