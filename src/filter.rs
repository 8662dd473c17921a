use crate::{models::LogRecord, timestamp};
use chrono::NaiveDate;
use serde::Deserialize;

/// Raw filter input as it arrives from a query string or the command line.
/// Every field is optional text; `"all"` and empty strings mean "no filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub method: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Status constraint after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Code(u16),
    /// The supplied value was not a status code, so nothing can match it.
    Unmatchable,
}

impl StatusFilter {
    pub fn parse(text: &str) -> Self {
        text.trim()
            .parse::<u16>()
            .map(StatusFilter::Code)
            .unwrap_or(StatusFilter::Unmatchable)
    }

    fn matches(self, status: u16) -> bool {
        self == StatusFilter::Code(status)
    }
}

impl From<u16> for StatusFilter {
    fn from(code: u16) -> Self {
        StatusFilter::Code(code)
    }
}

/// Normalized constraints. `None` imposes no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub method: Option<String>,
    pub status: Option<StatusFilter>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(method) = &self.method {
            if record.method != *method {
                return false;
            }
        }
        if let Some(status) = self.status {
            if !status.matches(record.status) {
                return false;
            }
        }
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }

        // Records without a usable date cannot satisfy a date range.
        let Some(date) = timestamp::normalize_date(&record.timestamp_raw) else {
            return false;
        };
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

impl From<FilterParams> for FilterCriteria {
    fn from(params: FilterParams) -> Self {
        FilterCriteria {
            method: supplied(params.method),
            status: supplied(params.status).map(|s| StatusFilter::parse(&s)),
            start_date: supplied(params.start_date).and_then(|s| parse_date_param(&s)),
            end_date: supplied(params.end_date).and_then(|s| parse_date_param(&s)),
        }
    }
}

fn supplied(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty() && v != "all")
}

/// Dates at the boundary are `YYYY-MM-DD`; anything else is ignored.
fn parse_date_param(text: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::debug!("ignoring malformed date filter {:?}: {}", text, e);
            None
        }
    }
}

/// Records satisfying every supplied constraint, in input order.
pub fn filter(records: &[LogRecord], criteria: &FilterCriteria) -> Vec<LogRecord> {
    if criteria.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}
