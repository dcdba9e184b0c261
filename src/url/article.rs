use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Matches the `article=<ID>` query parameter of an incident link
///
/// The id ends at the next `&`, `#`, whitespace or the end of the href, so
/// neither the `h?article=` prefix nor the `&opt=0` suffix can leak into it.
static ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[?&])article=([^&#\s]+)").expect("valid article regex")
});

/// Extracts the incident id from an article link
///
/// # Examples
///
/// ```
/// use avherald_watch::url::article_id;
///
/// assert_eq!(article_id("h?article=4f2a9c31&opt=0"), Some("4f2a9c31"));
/// assert_eq!(article_id("/h?article=4f2a9c31&opt=0"), Some("4f2a9c31"));
/// assert_eq!(article_id("/h?list=&opt=0"), None);
/// ```
pub fn article_id(href: &str) -> Option<&str> {
    ARTICLE_RE
        .captures(href.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Builds the detail-page URL of an incident
pub fn detail_url(root: &Url, id: &str) -> String {
    let mut url = root.clone();
    let base = root.path().trim_end_matches('/');
    url.set_path(&format!("{}/h", base));
    url.set_query(Some(&format!("article={}&opt=0", id)));
    url.set_fragment(None);
    url.to_string()
}
