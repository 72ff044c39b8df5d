//! Filesystem-safe names for persisted documents.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Characters that are not allowed in file names on common filesystems.
const UNSAFE_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

pub const MAX_STEM_CHARS: usize = 100;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Replace every unsafe character with `_`, one for one.
pub fn replace_unsafe_chars(text: &str) -> String {
    text.chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Unsafe characters and whitespace runs become underscores.
pub fn sanitize_title(title: &str) -> String {
    let replaced = replace_unsafe_chars(title.trim());
    WHITESPACE_RUN.replace_all(&replaced, "_").into_owned()
}

/// File stem for a paper title: sanitized, at most `MAX_STEM_CHARS`
/// characters, without trailing underscores. `None` when nothing is left.
pub fn file_stem(title: &str) -> Option<String> {
    let sanitized: String = sanitize_title(title).chars().take(MAX_STEM_CHARS).collect();
    let stem = sanitized.trim_end_matches('_');
    (!stem.is_empty()).then(|| stem.to_string())
}

/// File stem for a title line that keeps its spaces: at most
/// `MAX_STEM_CHARS` characters, no surrounding whitespace and no trailing
/// underscores. `None` when nothing is left.
pub fn title_line_stem(title: &str) -> Option<String> {
    let truncated: String = replace_unsafe_chars(title)
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();
    let stem = truncated.trim().trim_end_matches('_').trim_end();
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Last non-empty path segment of `url`, without a `.pdf` extension.
pub fn url_tail(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let segment = segment.strip_suffix(".pdf").unwrap_or(segment);
    let tail = replace_unsafe_chars(segment);
    (!tail.is_empty()).then_some(tail)
}

pub fn pdf_file_name(stem: &str) -> String {
    format!("{stem}.pdf")
}
