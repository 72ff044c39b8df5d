//! Keyword relevance filter.

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Which part of a paper the keyword filter is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// The text window of the downloaded document.
    DocumentText,
    /// The abstract published on the listing page.
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// No keywords configured; everything passes.
    Unfiltered,
    /// The first term that matched.
    Matched(String),
    Rejected,
}

impl FilterOutcome {
    pub fn is_match(&self) -> bool {
        !matches!(self, FilterOutcome::Rejected)
    }
}

/// Ordered keyword terms matched case-insensitively. Terms are regular
/// expressions; anything that does not compile is matched literally.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    terms: Vec<(String, Regex)>,
}

impl KeywordFilter {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .filter_map(|term| {
                let term = term.as_ref().trim();
                if term.is_empty() {
                    return None;
                }
                Some((term.to_string(), compile(term)))
            })
            .collect();
        Self { terms }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(term, _)| term.as_str())
    }

    /// Short-circuit OR over the terms in order.
    pub fn check(&self, text: &str) -> FilterOutcome {
        if self.terms.is_empty() {
            return FilterOutcome::Unfiltered;
        }
        self.terms
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(term, _)| FilterOutcome::Matched(term.clone()))
            .unwrap_or(FilterOutcome::Rejected)
    }
}

fn compile(term: &str) -> Regex {
    RegexBuilder::new(term)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|err| {
            warn!("keyword '{}' is not a valid pattern, matching literally: {}", term, err);
            RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .expect("escaped literal is a valid pattern")
        })
}
