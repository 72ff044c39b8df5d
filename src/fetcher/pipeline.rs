use crate::fetcher::types::{Charset, PageResponse};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::{StatusCode, header::HeaderMap};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// Only the head of a page is scanned for `<meta>` charset declarations.
const META_SCAN_BYTES: usize = 4096;

static HEADER_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// Turn a successful markup response into a UTF-8 page.
///
/// Decoding is lossy: a listing with a few bad bytes is still worth scanning
/// for links.
pub fn decode_page(
    url_final: Url,
    status: StatusCode,
    headers: HeaderMap,
    body_raw: Bytes,
    content_type: &str,
) -> PageResponse {
    let charset = detect_charset(content_type, &body_raw);
    let (decoded, _, had_errors) = charset.0.decode(&body_raw);
    if had_errors {
        debug!(
            url = %url_final,
            charset = charset.name(),
            "page contained undecodable bytes"
        );
    }

    PageResponse {
        url_final,
        status,
        headers,
        body_utf8: decoded.into_owned(),
        body_raw,
        charset,
        fetched_at: Utc::now(),
    }
}

/// Header declaration first, then `<meta>` declarations, then a heuristic guess.
pub fn detect_charset(content_type: &str, body: &[u8]) -> Charset {
    if let Some(encoding) = label_from(&HEADER_CHARSET, content_type) {
        return Charset(encoding);
    }

    let head = &body[..body.len().min(META_SCAN_BYTES)];
    let head_str = String::from_utf8_lossy(head);
    for pattern in [&*META_CHARSET, &*META_HTTP_EQUIV] {
        if let Some(encoding) = label_from(pattern, &head_str) {
            return Charset(encoding);
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body.len() <= META_SCAN_BYTES);
    Charset(detector.guess(None, true))
}

fn label_from(pattern: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = pattern.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_from_content_type() {
        let charset = detect_charset("text/html; charset=utf-8", b"<html></html>");
        assert!(charset.is_utf8());
    }

    #[test]
    fn charset_from_meta_tag() {
        let body = b"<html><head><meta charset=\"iso-8859-1\"><title>dblp</title></head></html>";
        // encoding_rs maps ISO-8859-1 to its superset windows-1252
        assert_eq!(
            detect_charset("text/html", body),
            Charset(encoding_rs::WINDOWS_1252)
        );
    }

    #[test]
    fn charset_from_meta_http_equiv() {
        let body = b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\"></head></html>";
        assert_eq!(
            detect_charset("text/html", body),
            Charset(encoding_rs::WINDOWS_1252)
        );
    }

    #[test]
    fn decode_page_keeps_utf8_text() {
        let body = Bytes::from("<p>Schöne Grüße, 世界</p>");
        let page = decode_page(
            Url::parse("https://dblp.org/db/conf/ccs/ccs2022.html").unwrap(),
            StatusCode::OK,
            HeaderMap::new(),
            body,
            "text/html; charset=utf-8",
        );
        assert_eq!(page.body_utf8, "<p>Schöne Grüße, 世界</p>");
    }

    #[test]
    fn decode_page_is_lossy_on_bad_bytes() {
        let body = Bytes::from_static(b"<p>ok \xff\xfe done</p>");
        let page = decode_page(
            Url::parse("https://example.com/").unwrap(),
            StatusCode::OK,
            HeaderMap::new(),
            body,
            "text/html; charset=utf-8",
        );
        assert!(page.body_utf8.starts_with("<p>ok "));
        assert!(page.body_utf8.ends_with(" done</p>"));
    }
}
