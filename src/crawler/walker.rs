//! Pagination walker
//!
//! Walks the feed backward from the site root, one page at a time, until it
//! reaches the watermark incident or runs out of pages. Fetches are strictly
//! sequential since each page's "next" link is only known once it is parsed.

use crate::crawler::extractor::extract_incident;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{parse_page, ParsedPage};
use crate::incident::Incident;
use crate::state::CrawlWatermark;
use crate::{ParseError, WatchError};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Why a walk stopped fetching pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStop {
    /// The watermark incident was found; everything newer was collected
    FoundWatermark,

    /// The last page of the feed was reached
    NoNextPage,

    /// The configured page limit was reached before the watermark
    PageLimit,

    /// A "next" link pointed at a page already fetched during this walk
    RevisitedPage,
}

impl fmt::Display for WalkStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FoundWatermark => "found watermark",
            Self::NoNextPage => "no next page",
            Self::PageLimit => "page limit",
            Self::RevisitedPage => "revisited page",
        };
        write!(f, "{}", label)
    }
}

/// Incidents collected by one walk
#[derive(Debug, Clone)]
pub struct WalkResult {
    /// Incidents newer than the watermark, newest first
    pub incidents: Vec<Incident>,

    /// Number of pages fetched
    pub pages_fetched: usize,

    /// Number of blocks skipped because no incident could be extracted
    pub skipped_blocks: usize,

    /// Why the walk stopped
    pub stop: WalkStop,
}

impl WalkResult {
    /// Id of the newest incident collected, if any
    pub fn newest_id(&self) -> Option<&str> {
        self.incidents.first().map(|incident| incident.id.as_str())
    }
}

/// Walks the paginated feed from its root
#[derive(Debug, Clone)]
pub struct Walker {
    fetcher: Fetcher,
    root: Url,
}

impl Walker {
    /// Creates a walker over the feed at `root`
    pub fn new(fetcher: Fetcher, root: Url) -> Self {
        Self { fetcher, root }
    }

    /// Returns the site root
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Collects every incident newer than the watermark
    ///
    /// # Algorithm
    ///
    /// 1. Fetch the current page (initially the site root) and parse it
    /// 2. Extract incidents block by block, newest first
    /// 3. Stop at the first incident whose id equals the watermark; it and
    ///    everything older are excluded
    /// 4. Otherwise follow the next-page link, unless there is none, it was
    ///    already visited, or `page_limit` pages have been fetched
    ///
    /// An incident repeated across pages (the feed shifted between fetches)
    /// is collected once.
    ///
    /// An unset watermark is never found, so the walk covers the whole feed
    /// (bounded by `page_limit`).
    ///
    /// # Errors
    ///
    /// * `WatchError::Fetch` - A page could not be fetched
    /// * `WatchError::Parse` - A page had no incident blocks or an
    ///   unresolvable next link; nothing collected so far is returned
    pub async fn walk(
        &self,
        watermark: &CrawlWatermark,
        page_limit: usize,
    ) -> Result<WalkResult, WatchError> {
        let page_limit = page_limit.max(1);
        let mut visited = HashSet::new();
        let mut collected = HashSet::new();
        let mut incidents = Vec::new();
        let mut pages_fetched = 0;
        let mut skipped_blocks = 0;
        let mut url = self.root.clone();

        let stop = loop {
            visited.insert(url.to_string());

            let html = self.fetcher.fetch(url.as_str()).await?;
            pages_fetched += 1;

            let ParsedPage { blocks, next_page } = parse_page(&html, &self.root)?;
            if blocks.is_empty() {
                return Err(ParseError::NoIncidentBlocks {
                    url: url.to_string(),
                }
                .into());
            }

            tracing::debug!("Page {} ({}): {} blocks", pages_fetched, url, blocks.len());

            let mut found = false;
            for block in &blocks {
                match extract_incident(block) {
                    Ok(incident) if watermark.is_reached_by(&incident.id) => {
                        found = true;
                        break;
                    }
                    Ok(incident) if !collected.insert(incident.id.clone()) => {
                        tracing::debug!("Incident {} already collected on an earlier page", incident.id);
                    }
                    Ok(incident) => incidents.push(incident),
                    Err(e) => {
                        skipped_blocks += 1;
                        tracing::warn!("Skipping block on {}: {}", url, e);
                    }
                }
            }

            if found {
                break WalkStop::FoundWatermark;
            }

            match next_page {
                None => break WalkStop::NoNextPage,
                Some(next) if visited.contains(next.as_str()) => {
                    tracing::warn!("Next-page link {} was already visited", next);
                    break WalkStop::RevisitedPage;
                }
                Some(_) if pages_fetched >= page_limit => break WalkStop::PageLimit,
                Some(next) => url = next,
            }
        };

        Ok(WalkResult {
            incidents,
            pages_fetched,
            skipped_blocks,
            stop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::FetchError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn row(id: &str) -> String {
        format!(
            r#"<tr><td><img alt="Incident"></td><td><a href="/h?article={id}&opt=0"><span class="headline_avherald">Delta B752 at Atlanta on Jan 1st 2013, incident {id}</span></a></td></tr>"#
        )
    }

    fn page(ids: &[&str], next: Option<&str>) -> String {
        let rows: Vec<String> = ids.iter().map(|id| row(id)).collect();
        let nav = next
            .map(|href| format!(r#"<a href="{}"><img src="/images/next.jpg"></a>"#, href))
            .unwrap_or_default();
        format!(
            "<html><body><table>{}</table>{}</body></html>",
            rows.join(""),
            nav
        )
    }

    async fn mount_page(server: &MockServer, route: &str, body: String, hits: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(hits)
            .mount(server)
            .await;
    }

    fn walker(server: &MockServer) -> Walker {
        let fetcher = Fetcher::new(&CrawlerConfig::default()).unwrap();
        let root = crate::url::parse_root_url(&server.uri()).unwrap();
        Walker::new(fetcher, root)
    }

    fn ids(result: &WalkResult) -> Vec<&str> {
        result.incidents.iter().map(|i| i.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_stops_at_watermark_on_second_page() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i9", "i8", "i7"], Some("/page2")), 1).await;
        mount_page(&server, "/page2", page(&["i6", "i5", "i4"], Some("/page3")), 1).await;
        mount_page(&server, "/page3", page(&["i3", "i2", "i1"], None), 0).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::new("i5"), 100)
            .await
            .unwrap();

        assert_eq!(result.pages_fetched, 2);
        assert_eq!(result.stop, WalkStop::FoundWatermark);
        assert_eq!(ids(&result), vec!["i9", "i8", "i7", "i6"]);
        assert_eq!(result.newest_id(), Some("i9"));
    }

    #[tokio::test]
    async fn test_watermark_is_newest_incident() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i9", "i8"], Some("/page2")), 1).await;
        mount_page(&server, "/page2", page(&["i7"], None), 0).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::new("i9"), 100)
            .await
            .unwrap();

        assert!(result.incidents.is_empty());
        assert_eq!(result.newest_id(), None);
        assert_eq!(result.stop, WalkStop::FoundWatermark);
    }

    #[tokio::test]
    async fn test_empty_watermark_walks_entire_feed() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i4", "i3"], Some("/page2")), 1).await;
        mount_page(&server, "/page2", page(&["i2", "i1"], None), 1).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::empty(), 100)
            .await
            .unwrap();

        assert_eq!(result.stop, WalkStop::NoNextPage);
        assert_eq!(ids(&result), vec!["i4", "i3", "i2", "i1"]);
    }

    #[tokio::test]
    async fn test_incident_repeated_on_next_page_is_collected_once() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i4", "i3"], Some("/page2")), 1).await;
        mount_page(&server, "/page2", page(&["i3", "i2"], None), 1).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::empty(), 100)
            .await
            .unwrap();

        assert_eq!(result.stop, WalkStop::NoNextPage);
        assert_eq!(ids(&result), vec!["i4", "i3", "i2"]);
    }

    #[tokio::test]
    async fn test_page_limit() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i4", "i3"], Some("/page2")), 1).await;
        mount_page(&server, "/page2", page(&["i2", "i1"], None), 0).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::empty(), 1)
            .await
            .unwrap();

        assert_eq!(result.stop, WalkStop::PageLimit);
        assert_eq!(result.pages_fetched, 1);
        assert_eq!(ids(&result), vec!["i4", "i3"]);
    }

    #[tokio::test]
    async fn test_next_link_loop_is_detected() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i4"], Some("/page2")), 1).await;
        mount_page(&server, "/page2", page(&["i3"], Some("/")), 1).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::empty(), 100)
            .await
            .unwrap();

        assert_eq!(result.stop, WalkStop::RevisitedPage);
        assert_eq!(ids(&result), vec!["i4", "i3"]);
    }

    #[tokio::test]
    async fn test_blocks_without_id_are_skipped() {
        let server = MockServer::start().await;
        let body = format!(
            "<html><body><table>{}{}</table></body></html>",
            row("i2"),
            r#"<tr><td></td><td><a href="/h?list="><span class="headline_avherald">Ad</span></a></td></tr>"#
        );
        mount_page(&server, "/", body, 1).await;

        let result = walker(&server)
            .walk(&CrawlWatermark::empty(), 100)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec!["i2"]);
        assert_eq!(result.skipped_blocks, 1);
    }

    #[tokio::test]
    async fn test_page_without_blocks_is_an_error() {
        let server = MockServer::start().await;
        mount_page(&server, "/", page(&["i4"], Some("/page2")), 1).await;
        mount_page(
            &server,
            "/page2",
            "<html><body>Down for maintenance</body></html>".to_string(),
            1,
        )
        .await;

        let result = walker(&server).walk(&CrawlWatermark::empty(), 100).await;
        assert!(matches!(
            result,
            Err(WatchError::Parse(ParseError::NoIncidentBlocks { .. }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = walker(&server).walk(&CrawlWatermark::empty(), 100).await;
        assert!(matches!(
            result,
            Err(WatchError::Fetch(FetchError::Status { status: 500, .. }))
        ));
    }
}
