//! Candidate discovery over `href` attributes.

use crate::sources::{CandidateLink, SourceContext};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static ANCHORS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Matches an `href` and expands the captures into the final-form URL.
#[derive(Debug, Clone)]
pub struct HrefMatcher {
    pattern: &'static Regex,
    template: String,
}

impl HrefMatcher {
    /// `template` uses regex replacement syntax, e.g. `https://host/pdf/${1}`.
    pub fn new(pattern: &'static Regex, template: impl Into<String>) -> Self {
        Self {
            pattern,
            template: template.into(),
        }
    }

    pub fn rewrite(&self, href: &str) -> Option<String> {
        let captures = self.pattern.captures(href)?;
        let mut url = String::new();
        captures.expand(&self.template, &mut url);
        Some(url)
    }
}

/// Every anchor whose `href` the matcher accepts, in document order,
/// deduplicated by rewritten URL.
pub fn discover_by_href(
    markup: &str,
    matcher: &HrefMatcher,
    context: &SourceContext,
) -> Vec<CandidateLink> {
    let document = Html::parse_document(markup);
    let candidates = document.select(&ANCHORS).filter_map(|anchor| {
        let href = anchor.value().attr("href")?;
        let url = matcher.rewrite(href)?;
        Some(CandidateLink {
            reference: href.to_string(),
            url,
            context: context.clone(),
            record: None,
        })
    });
    dedup_by_url(candidates)
}

/// Keep the first occurrence of each URL.
pub fn dedup_by_url(candidates: impl IntoIterator<Item = CandidateLink>) -> Vec<CandidateLink> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.url.clone()))
        .collect()
}
