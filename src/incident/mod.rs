//! Incident records scraped from the feed
//!
//! An `Incident` is built fresh for every block of every crawl cycle and is
//! never mutated afterwards.

/// Structured fields parsed out of a headline of the form
/// `"<airline> <model> <at|over|enroute|near> <city> on <date>, <reason>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrative {
    pub airline: String,
    pub model: String,
    pub city: String,
    pub date_text: String,
    pub reason_text: String,
}

/// One scraped incident
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    /// Opaque article token; the only key the feed exposes
    pub id: String,

    /// Raw headline text
    pub headline_text: String,

    /// Category taken from the block's icon alt text
    pub incident_type: Option<String>,

    /// Narrative fields, present only when the headline has the usual shape
    pub narrative: Option<Narrative>,
}

impl Incident {
    pub fn airline(&self) -> Option<&str> {
        self.narrative.as_ref().map(|n| n.airline.as_str())
    }

    pub fn model(&self) -> Option<&str> {
        self.narrative.as_ref().map(|n| n.model.as_str())
    }

    pub fn city(&self) -> Option<&str> {
        self.narrative.as_ref().map(|n| n.city.as_str())
    }

    pub fn date_text(&self) -> Option<&str> {
        self.narrative.as_ref().map(|n| n.date_text.as_str())
    }

    pub fn reason_text(&self) -> Option<&str> {
        self.narrative.as_ref().map(|n| n.reason_text.as_str())
    }
}
