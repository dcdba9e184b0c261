//! Incident extraction from a single feed block
//!
//! The id and incident type come from the block's markup and are extracted
//! independently of the headline. The narrative fields come from one pattern
//! applied to the headline text; a headline in another style only loses its
//! narrative, never the whole incident.

use crate::crawler::parser::HEADLINE_SELECTOR;
use crate::incident::{Incident, Narrative};
use crate::url::article_id;
use crate::ExtractionError;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[alt]").expect("valid image selector"));

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));

/// `<airline> <model> <at|over|enroute|near> <city> on <date>, <reason>`
///
/// City and date are lazy so that " on " or ", " inside the reason stay in
/// the reason.
static NARRATIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*) ([A-Z0-9]+) (at|over|enroute|near) (.*?) on (.*?), (.*)$")
        .expect("valid narrative regex")
});

/// Extracts an incident from the HTML of one feed block
///
/// # Returns
///
/// * `Ok(Incident)` - The incident; `narrative` is None when the headline
///   does not have the usual shape
/// * `Err(ExtractionError::MissingId)` - The block has no article link, so
///   it cannot take part in watermark tracking
///
/// # Example
///
/// ```
/// use avherald_watch::crawler::extract_incident;
///
/// let block = r#"<tr><td><img alt="Crash"></td><td><a href="/h?article=2a3b&opt=0">
///     <span class="headline_avherald">AF 447 over Atlantic on 2009-06-01, pitot tube icing</span>
/// </a></td></tr>"#;
/// let incident = extract_incident(block).unwrap();
/// assert_eq!(incident.id, "2a3b");
/// assert_eq!(incident.airline(), Some("AF"));
/// ```
pub fn extract_incident(block_html: &str) -> Result<Incident, ExtractionError> {
    let fragment = Html::parse_fragment(block_html);

    let id = fragment
        .select(&LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .find_map(article_id)
        .ok_or(ExtractionError::MissingId)?
        .to_string();

    let incident_type = fragment
        .select(&IMAGE_SELECTOR)
        .filter_map(|image| image.value().attr("alt"))
        .map(str::trim)
        .find(|alt| !alt.is_empty())
        .map(str::to_string);

    let headline_text = fragment
        .select(&HEADLINE_SELECTOR)
        .next()
        .map(|span| span.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let narrative = match parse_narrative(&headline_text) {
        Ok(narrative) => Some(narrative),
        Err(e) => {
            tracing::debug!("Incident {}: {}", id, e);
            None
        }
    };

    Ok(Incident {
        id,
        headline_text,
        incident_type,
        narrative,
    })
}

/// Parses the narrative fields out of a headline
pub fn parse_narrative(headline: &str) -> Result<Narrative, ExtractionError> {
    let mismatch = || ExtractionError::NarrativeMismatch {
        headline: headline.to_string(),
    };

    let caps = NARRATIVE_RE.captures(headline.trim()).ok_or_else(mismatch)?;
    let field = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Ok(Narrative {
        airline: field(1).ok_or_else(mismatch)?,
        model: field(2).ok_or_else(mismatch)?,
        city: field(4).ok_or_else(mismatch)?,
        date_text: field(5).ok_or_else(mismatch)?,
        reason_text: field(6).ok_or_else(mismatch)?,
    })
}
