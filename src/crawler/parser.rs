//! Feed page parser
//!
//! This module locates the incident blocks of one feed page and its
//! "next page" link. Each headline sits in `tr > td > a > span`, so a block
//! is the table row three ancestors above the headline span. Any other
//! nesting contributes no block, which callers treat as an unrecognized page.

use crate::url::resolve_link;
use crate::ParseError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Class marking the headline span of every incident
pub const HEADLINE_CLASS: &str = "headline_avherald";

pub(crate) static HEADLINE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("span.{}", HEADLINE_CLASS)).expect("valid headline selector")
});

static NEXT_IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"img[src$="next.jpg"]"#).expect("valid next selector"));

/// Number of ancestors between a headline span and its incident block
const BLOCK_DEPTH: usize = 3;

/// Extracted structure of one feed page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Outer HTML of every incident block, newest first
    pub blocks: Vec<String>,

    /// Absolute URL of the next (older) page, if any
    pub next_page: Option<Url>,
}

/// Parses a feed page into incident blocks and the next-page link
///
/// Blocks are returned as owned HTML fragments in document order, which on
/// this feed is newest first.
///
/// # Arguments
///
/// * `html` - The raw page HTML
/// * `root` - The site root that pagination links resolve against
///
/// # Returns
///
/// * `Ok(ParsedPage)` - Blocks (possibly none) and the optional next link
/// * `Err(ParseError::NextLink)` - A next-page image exists but its link
///   cannot be resolved
///
/// # Example
///
/// ```
/// use avherald_watch::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<table><tr><td><img alt="Incident"></td><td>
///     <a href="/h?article=4f2a9c31&opt=0"><span class="headline_avherald">Headline</span></a>
/// </td></tr></table>"#;
/// let root = Url::parse("http://avherald.com/").unwrap();
/// let page = parse_page(html, &root).unwrap();
/// assert_eq!(page.blocks.len(), 1);
/// assert!(page.next_page.is_none());
/// ```
pub fn parse_page(html: &str, root: &Url) -> Result<ParsedPage, ParseError> {
    let document = Html::parse_document(html);

    let blocks = extract_blocks(&document);
    let next_page = extract_next_page(&document, root)?;

    Ok(ParsedPage { blocks, next_page })
}

/// Collects the incident block above every headline span
fn extract_blocks(document: &Html) -> Vec<String> {
    let mut seen = Vec::new();
    let mut blocks = Vec::new();

    for headline in document.select(&HEADLINE_SELECTOR) {
        let Some(block) = block_for(headline) else {
            tracing::debug!("Headline span without a table row {} levels up", BLOCK_DEPTH);
            continue;
        };

        if seen.contains(&block.id()) {
            continue;
        }
        seen.push(block.id());
        blocks.push(block.html());
    }

    blocks
}

/// Returns the table row enclosing a headline span
fn block_for(headline: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut node = *headline;
    for _ in 0..BLOCK_DEPTH {
        node = node.parent()?;
    }

    ElementRef::wrap(node).filter(|element| element.value().name() == "tr")
}

/// Finds the "next" navigation image and resolves its enclosing link
fn extract_next_page(document: &Html, root: &Url) -> Result<Option<Url>, ParseError> {
    let Some(image) = document.select(&NEXT_IMAGE_SELECTOR).next() else {
        return Ok(None);
    };

    let href = image
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "a")
        .and_then(|anchor| anchor.value().attr("href"))
        .ok_or_else(|| ParseError::NextLink {
            href: String::new(),
            message: "next-page image is not inside a link".to_string(),
        })?;

    resolve_link(href, root)
        .map(Some)
        .ok_or_else(|| ParseError::NextLink {
            href: href.to_string(),
            message: "link does not resolve to an HTTP(S) URL".to_string(),
        })
}
