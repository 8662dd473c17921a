//! Timestamp normalization.
//!
//! Formats are tried in a fixed order and the first that parses wins. Only
//! the native log form carries a time of day; the others yield midnight.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `15/Jan/2025:14:30:45`, optionally followed by a `+0200` offset.
    Native,
    /// `2025-01-15 14:30:45`
    IsoDateTime,
    /// `2025-01-15`
    IsoDate,
    /// `15/01/2025`
    DayMonthYear,
    /// `01/15/2025`
    MonthDayYear,
}

impl TimestampFormat {
    /// Resolution order for [`normalize`].
    pub const ORDER: [TimestampFormat; 5] = [
        TimestampFormat::Native,
        TimestampFormat::IsoDateTime,
        TimestampFormat::IsoDate,
        TimestampFormat::DayMonthYear,
        TimestampFormat::MonthDayYear,
    ];

    fn pattern(self) -> &'static str {
        match self {
            TimestampFormat::Native => "%d/%b/%Y:%H:%M:%S",
            TimestampFormat::IsoDateTime => "%Y-%m-%d %H:%M:%S",
            TimestampFormat::IsoDate => "%Y-%m-%d",
            TimestampFormat::DayMonthYear => "%d/%m/%Y",
            TimestampFormat::MonthDayYear => "%m/%d/%Y",
        }
    }

    pub fn parse(self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        match self {
            TimestampFormat::Native => {
                let (stamp, offset) = text.split_once(' ').unwrap_or((text, ""));
                if !offset.is_empty() && !is_utc_offset(offset.trim()) {
                    return None;
                }
                NaiveDateTime::parse_from_str(stamp, self.pattern()).ok()
            }
            TimestampFormat::IsoDateTime => {
                NaiveDateTime::parse_from_str(text, self.pattern()).ok()
            }
            _ => NaiveDate::parse_from_str(text, self.pattern())
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        }
    }
}

/// `+0200` / `-0700`
fn is_utc_offset(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 5
        && matches!(bytes[0], b'+' | b'-')
        && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Parse `text` with the first matching format.
pub fn normalize(text: &str) -> Option<(NaiveDateTime, TimestampFormat)> {
    TimestampFormat::ORDER
        .into_iter()
        .find_map(|format| format.parse(text).map(|dt| (dt, format)))
}

/// Calendar date of `text`, used for date-range comparisons.
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    normalize(text).map(|(dt, _)| dt.date())
}

/// Parse only the native log form. Time-series bucketing uses this and does
/// not fall back to the other formats.
pub fn parse_native(text: &str) -> Option<NaiveDateTime> {
    TimestampFormat::Native.parse(text)
}

static EMBEDDED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\[([^\]]+)\]",
        r"([0-9]{1,2}/[A-Za-z]{3}/[0-9]{4}:[0-9]{2}:[0-9]{2}:[0-9]{2})",
        r"([0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2})",
        r"([0-9]{4}-[0-9]{2}-[0-9]{2})",
        r"([0-9]{1,2}/[0-9]{1,2}/[0-9]{4})",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("embedded timestamp pattern is valid"))
    .collect()
});

/// Find and normalize a timestamp embedded anywhere in a raw line, for text
/// that has no parsed timestamp field.
pub fn extract_date(line: &str) -> Option<NaiveDate> {
    EMBEDDED_PATTERNS.iter().find_map(|re| {
        re.captures_iter(line)
            .find_map(|caps| normalize_date(caps.get(1)?.as_str()))
    })
}
