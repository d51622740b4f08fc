// src/utils/url.rs

//! URL manipulation utilities.
//!
//! Host keys, link resolution, and the robustness heuristics that keep
//! crawler traps out of the frontier.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Longest URL accepted (the limit Googlebot uses).
pub const MAX_URL_LENGTH: usize = 2048;

/// Path segments at least this long are treated as traps.
pub const MAX_SEGMENT_LENGTH: usize = 300;

static CMS_DIRECTORY_CHAIN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?:/(?:misc|sites|all|themes|modules|profiles|css|field|node|theme)){3,}(?:/|$)",
    )
    .ok()
});

/// Host key used for politeness and ownership.
///
/// The host with a leading `www.` removed, plus the port when one is given
/// explicitly.
///
/// # Examples
/// ```
/// use polite_crawler::utils::url::host_key;
///
/// let url = url::Url::parse("https://www.example.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let bare = host.strip_prefix("www.").unwrap_or(host);
    Some(match url.port() {
        Some(port) => format!("{bare}:{port}"),
        None => bare.to_string(),
    })
}

/// Host key of a URL string, if it parses.
pub fn resolve_host(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(host_key)
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Drop query and fragment: the former aliases faceted navigation, the
/// latter never changes the fetched document.
pub fn strip_query_and_fragment(url: &mut Url) {
    url.set_query(None);
    url.set_fragment(None);
}

/// Whether a normalized URL passes the crawler-trap heuristics.
pub fn is_robust(url: &str) -> bool {
    if url.len() > MAX_URL_LENGTH {
        return false;
    }
    if url.contains("calendar") {
        return false;
    }

    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => return false,
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| s.len() >= MAX_SEGMENT_LENGTH) {
        return false;
    }
    if has_repeated_directory(&path) {
        return false;
    }

    match CMS_DIRECTORY_CHAIN.as_ref() {
        Some(re) => !re.is_match(&path),
        None => true,
    }
}

/// Whether any directory segment of the path shows up more than once.
fn has_repeated_directory(path: &str) -> bool {
    let mut directories: Vec<&str> = path.split('/').collect();
    // The final segment is the document, not a directory.
    directories.pop();

    let mut seen = HashSet::new();
    directories
        .into_iter()
        .filter(|s| !s.is_empty())
        .any(|dir| !seen.insert(dir))
}

/// Resolve, normalize, and trap-filter an `href` found on `base`.
///
/// Returns `None` for non-HTTP targets and for URLs rejected by
/// [`is_robust`].
pub fn normalize_link(base: &Url, href: &str) -> Option<String> {
    let mut resolved = resolve_url(base, href)?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    strip_query_and_fragment(&mut resolved);

    let candidate = resolved.to_string();
    is_robust(&candidate).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_host_key_strips_www() {
        assert_eq!(
            host_key(&url("https://www.Example.com/a")),
            Some("example.com".to_string())
        );
        assert_eq!(
            host_key(&url("https://en.wikipedia.org/wiki/Main_Page")),
            Some("en.wikipedia.org".to_string())
        );
    }

    #[test]
    fn test_host_key_keeps_explicit_port() {
        assert_eq!(
            host_key(&url("http://127.0.0.1:8080/x")),
            Some("127.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn test_resolve_host_rejects_garbage() {
        assert_eq!(resolve_host("not a url"), None);
        assert_eq!(resolve_host("https://a.com/1"), Some("a.com".to_string()));
    }

    #[test]
    fn test_normalize_link_relative_and_absolute() {
        let base = url("https://example.com/path/index.html");
        assert_eq!(
            normalize_link(&base, "other.html"),
            Some("https://example.com/path/other.html".to_string())
        );
        assert_eq!(
            normalize_link(&base, "/root.html?sort=asc#top"),
            Some("https://example.com/root.html".to_string())
        );
        assert_eq!(
            normalize_link(&base, "https://other.com/x"),
            Some("https://other.com/x".to_string())
        );
    }

    #[test]
    fn test_normalize_link_skips_non_http() {
        let base = url("https://example.com/");
        assert_eq!(normalize_link(&base, "mailto:me@example.com"), None);
        assert_eq!(normalize_link(&base, "javascript:void(0)"), None);
    }

    #[test]
    fn test_is_robust_accepts_plain_urls() {
        assert!(is_robust("https://example.com/docs/guide/intro.html"));
        assert!(is_robust("https://example.com/"));
    }

    #[test]
    fn test_is_robust_rejects_traps() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(!is_robust(&long));

        let long_segment = format!("https://example.com/x/{}", "b".repeat(MAX_SEGMENT_LENGTH));
        assert!(!is_robust(&long_segment));

        assert!(!is_robust("https://example.com/a/b/a/page.html"));
        assert!(!is_robust("https://example.com/sites/all/themes/x.css"));
        assert!(!is_robust("https://example.com/events/calendar/2031"));
    }

    #[test]
    fn test_repeated_directory_ignores_document_name() {
        assert!(!has_repeated_directory("/docs/docs"));
        assert!(has_repeated_directory("/docs/docs/"));
    }
}
