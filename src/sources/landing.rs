//! Picking the document out of an indirect landing page.
//!
//! Landing pages embed several resources (scripts, tracking pixels, the
//! document frame). The document frame is taken to be the last frame-like
//! element carrying a `src`; pages without one fall back to the last element
//! with a `src` in document order.

use scraper::{Html, Selector};
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

static WITH_SRC: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[src]").unwrap());

const FRAME_TAGS: [&str; 4] = ["iframe", "frame", "embed", "object"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LandingError {
    #[error("no element with a src attribute")]
    NoResource,

    #[error("malformed resource url '{src}': {source}")]
    BadUrl {
        src: String,
        #[source]
        source: url::ParseError,
    },
}

pub fn primary_resource(markup: &str, base: &Url) -> Result<Url, LandingError> {
    let document = Html::parse_document(markup);
    let resources: Vec<(String, String)> = document
        .select(&WITH_SRC)
        .filter_map(|element| {
            let src = element.value().attr("src")?.trim();
            (!src.is_empty()).then(|| (element.value().name().to_string(), src.to_string()))
        })
        .collect();

    let (_, src) = resources
        .iter()
        .rev()
        .find(|(tag, _)| FRAME_TAGS.contains(&tag.as_str()))
        .or_else(|| resources.last())
        .ok_or(LandingError::NoResource)?;

    base.join(src).map_err(|source| LandingError::BadUrl {
        src: src.clone(),
        source,
    })
}
