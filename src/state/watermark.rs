/// Crawl watermark: the single piece of durable crawl state
use std::fmt;

/// The id of the newest incident already seen by the watcher
///
/// The pagination walker stops collecting as soon as it reaches an incident
/// carrying this id. An unset watermark means nothing has been seen yet, so
/// a walk will traverse the whole feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlWatermark {
    last_id: Option<String>,
}

impl CrawlWatermark {
    /// Creates a watermark positioned at the given incident id
    ///
    /// A blank id yields an unset watermark.
    pub fn new(last_id: impl Into<String>) -> Self {
        let last_id = last_id.into();
        let trimmed = last_id.trim();

        if trimmed.is_empty() {
            Self::empty()
        } else {
            Self {
                last_id: Some(trimmed.to_string()),
            }
        }
    }

    /// Creates an unset watermark
    pub fn empty() -> Self {
        Self { last_id: None }
    }

    /// Returns the id of the newest incident already seen, if any
    pub fn last_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Returns true if no incident has been seen yet
    pub fn is_empty(&self) -> bool {
        self.last_id.is_none()
    }

    /// Returns true if an incident with this id is at or behind the watermark
    pub fn is_reached_by(&self, id: &str) -> bool {
        self.last_id.as_deref() == Some(id)
    }

    /// Moves the watermark to a newer incident
    ///
    /// Blank ids are ignored so a malformed incident can never clear the
    /// watermark.
    pub fn advance(&mut self, id: &str) {
        let id = id.trim();
        if !id.is_empty() {
            self.last_id = Some(id.to_string());
        }
    }
}

impl fmt::Display for CrawlWatermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_id {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "<unset>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_watermark() {
        let watermark = CrawlWatermark::new("4f2a9c31");
        assert_eq!(watermark.last_id(), Some("4f2a9c31"));
        assert!(!watermark.is_empty());
    }

    #[test]
    fn test_blank_id_is_unset() {
        assert!(CrawlWatermark::new("").is_empty());
        assert!(CrawlWatermark::new("   \n").is_empty());
        assert_eq!(CrawlWatermark::new(""), CrawlWatermark::empty());
    }

    #[test]
    fn test_is_reached_by() {
        let watermark = CrawlWatermark::new("abc");
        assert!(watermark.is_reached_by("abc"));
        assert!(!watermark.is_reached_by("abd"));
        assert!(!CrawlWatermark::empty().is_reached_by(""));
    }

    #[test]
    fn test_advance() {
        let mut watermark = CrawlWatermark::empty();
        watermark.advance("first");
        assert_eq!(watermark.last_id(), Some("first"));

        watermark.advance("second");
        assert_eq!(watermark.last_id(), Some("second"));

        watermark.advance("  ");
        assert_eq!(watermark.last_id(), Some("second"));
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlWatermark::new("x1").to_string(), "x1");
        assert_eq!(CrawlWatermark::empty().to_string(), "<unset>");
    }
}
