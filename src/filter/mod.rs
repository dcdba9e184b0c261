//! Incident filtering
//!
//! An incident passes when its airline, model and city are each accepted
//! (an empty set accepts anything) and, if keywords are configured, at least
//! one whitespace-delimited word of its reason is a keyword.

mod keywords;

use crate::config::FilterConfig;
use crate::incident::Incident;
use std::collections::HashSet;

pub use keywords::keyword_hits;

/// Filter criteria, read-only for the lifetime of the crawl
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    airlines: HashSet<String>,
    models: HashSet<String>,
    cities: HashSet<String>,
    keywords: HashSet<String>,
    keyword_fan_out: bool,
}

impl FilterCriteria {
    /// Builds criteria from the `[filter]` configuration section
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            airlines: to_set(&config.airline),
            models: to_set(&config.model),
            cities: to_set(&config.city),
            keywords: to_set(&config.keywords),
            keyword_fan_out: config.keyword_fan_out,
        }
    }

    /// Returns true if no criterion restricts anything
    pub fn is_unrestricted(&self) -> bool {
        self.airlines.is_empty()
            && self.models.is_empty()
            && self.cities.is_empty()
            && self.keywords.is_empty()
    }

    /// Returns true if the incident should be emitted at least once
    pub fn matches(&self, incident: &Incident) -> bool {
        self.matches_structure(incident) && self.matches_keywords(incident)
    }

    /// Returns the emissions an incident produces
    ///
    /// Each entry is one downstream record, tagged with the keyword that
    /// produced it. Without keywords an accepted incident yields a single
    /// untagged record. With keyword fan-out enabled an incident yields one
    /// record per keyword hit in its reason, so a reason repeating or
    /// combining keywords is emitted several times.
    pub fn emissions(&self, incident: &Incident) -> Vec<Option<String>> {
        if !self.matches_structure(incident) {
            return Vec::new();
        }

        if self.keywords.is_empty() {
            return vec![None];
        }

        let hits = keyword_hits(incident.reason_text(), &self.keywords);
        if self.keyword_fan_out {
            hits.into_iter().map(|hit| Some(hit.to_string())).collect()
        } else {
            hits.into_iter()
                .next()
                .map(|hit| vec![Some(hit.to_string())])
                .unwrap_or_default()
        }
    }

    /// Airline, model and city checks
    fn matches_structure(&self, incident: &Incident) -> bool {
        accepts(&self.airlines, incident.airline())
            && accepts(&self.models, incident.model())
            && accepts(&self.cities, incident.city())
    }

    fn matches_keywords(&self, incident: &Incident) -> bool {
        self.keywords.is_empty() || !keyword_hits(incident.reason_text(), &self.keywords).is_empty()
    }
}

/// An empty set accepts anything; otherwise the value must be present
fn accepts(set: &HashSet<String>, value: Option<&str>) -> bool {
    set.is_empty() || value.map(|v| set.contains(v)).unwrap_or(false)
}

fn to_set(values: &[String]) -> HashSet<String> {
    values.iter().map(|v| v.trim().to_string()).collect()
}
