//! URL handling module for avherald-watch
//!
//! This module resolves feed links against the configured site root and
//! maps between article links and incident ids.

mod article;

use url::Url;

// Re-export main functions
pub use article::{article_id, detail_url};

/// Parses the configured site root
///
/// A root without a path (`http://host:port`) is given `/` so that relative
/// links join against the site root rather than replacing its last segment.
pub fn parse_root_url(root: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(root.trim())?;
    if url.path().is_empty() {
        url.set_path("/");
    }
    Ok(url)
}

/// Resolves a link href against the site root
///
/// Returns None if the link should not be followed:
/// - empty hrefs and fragment-only links
/// - javascript:, mailto:, tel: and data: URIs
/// - anything that does not resolve to an HTTP(S) URL
pub fn resolve_link(href: &str, root: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match root.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
