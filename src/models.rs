use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, collections::HashMap, fmt};

// ── Records ────────────────────────────────────────────────────────────────

/// One successfully parsed access-log entry.
///
/// Records are only ever built by the line parser from a full grammar match,
/// so every field is present. They are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub client_ip: String,
    /// The bracketed timestamp exactly as written, e.g. `15/Jan/2025:14:30:45 +0200`.
    pub timestamp_raw: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub size: ResponseSize,
    /// Stored verbatim; combined logs write `-` when no referrer was sent.
    pub referrer: String,
    pub user_agent: String,
}

impl LogRecord {
    /// The referrer, or `None` when the log recorded `-` or nothing at all.
    pub fn referrer_url(&self) -> Option<&str> {
        match self.referrer.as_str() {
            "" | "-" => None,
            other => Some(other),
        }
    }
}

/// An ordered sequence of records in file order. Duplicates are kept.
pub type LogCollection = Vec<LogRecord>;

/// Response body size. Servers log `-` when no body was sent.
///
/// The digits are kept exactly as logged (leading zeros included), so a
/// value too large for any integer type still round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResponseSize {
    Bytes(String),
    Unknown,
}

impl ResponseSize {
    /// Numeric value, if the logged digits fit in a `u64`.
    pub fn bytes(&self) -> Option<u64> {
        match self {
            ResponseSize::Bytes(digits) => digits.parse().ok(),
            ResponseSize::Unknown => None,
        }
    }
}

impl fmt::Display for ResponseSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSize::Bytes(digits) => f.write_str(digits),
            ResponseSize::Unknown => f.write_str("-"),
        }
    }
}

impl Serialize for ResponseSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Aggregates ─────────────────────────────────────────────────────────────

/// `(key, count)` pairs, highest count first.
pub type TopN = Vec<(String, usize)>;

/// Which keyword class a user-agent string falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAgentClass {
    Bot,
    Browser,
    Unknown,
}

/// Occurrence counts per lower-cased user-agent string, split by class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserAgentClasses {
    pub bots: HashMap<String, usize>,
    pub browsers: HashMap<String, usize>,
    pub unknown: HashMap<String, usize>,
}

impl UserAgentClasses {
    pub fn get(&self, class: UserAgentClass) -> &HashMap<String, usize> {
        match class {
            UserAgentClass::Bot => &self.bots,
            UserAgentClass::Browser => &self.browsers,
            UserAgentClass::Unknown => &self.unknown,
        }
    }

    pub(crate) fn get_mut(&mut self, class: UserAgentClass) -> &mut HashMap<String, usize> {
        match class {
            UserAgentClass::Bot => &mut self.bots,
            UserAgentClass::Browser => &mut self.browsers,
            UserAgentClass::Unknown => &mut self.unknown,
        }
    }
}

/// Every summary structure computed over one collection, used by the
/// dashboard, the JSON API and the Markdown report.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_requests: usize,
    pub unique_clients: usize,
    pub top_clients: TopN,
    pub top_urls: TopN,
    pub status_distribution: BTreeMap<u16, usize>,
    pub hourly_volume: BTreeMap<String, usize>,
    pub daily_volume: BTreeMap<String, usize>,
    pub user_agents: UserAgentClasses,
}
