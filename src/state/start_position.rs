/// Start policy applied when no watermark has been persisted
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Where the watcher begins when it has no persisted watermark to resume
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum StartPosition {
    /// Backfill the entire paginated history once
    Beginning,

    /// Only watch for incidents published from now on
    End,

    /// Emit the single newest incident, then watch from there
    Last,

    /// Resume after an explicitly configured incident id
    Id(String),
}

impl StartPosition {
    /// Returns true if the first tick only establishes a watermark from the
    /// newest page instead of walking back through history
    pub fn primes_from_newest(&self) -> bool {
        matches!(self, Self::End | Self::Last)
    }
}

impl Default for StartPosition {
    fn default() -> Self {
        Self::End
    }
}

impl FromStr for StartPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err("start-position cannot be empty".to_string()),
            "beginning" => Ok(Self::Beginning),
            "end" => Ok(Self::End),
            "last" => Ok(Self::Last),
            id => Ok(Self::Id(id.to_string())),
        }
    }
}

impl TryFrom<String> for StartPosition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginning => write!(f, "beginning"),
            Self::End => write!(f, "end"),
            Self::Last => write!(f, "last"),
            Self::Id(id) => write!(f, "{}", id),
        }
    }
}
