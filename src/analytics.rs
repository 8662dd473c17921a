use crate::{
    models::{LogRecord, Summary, TopN, UserAgentClass, UserAgentClasses},
    timestamp,
};
use std::collections::{hash_map::Entry, BTreeMap, HashMap, HashSet};

pub const DEFAULT_TOP_N: usize = 5;

const BOT_TOKENS: [&str; 3] = ["bot", "spider", "crawler"];
const BROWSER_TOKENS: [&str; 3] = ["mozilla", "chrome", "safari"];

// ── Frequency tables ───────────────────────────────────────────────────────

/// Occurrence counts that remember the order keys were first seen in, so
/// ties in [`FrequencyTable::top`] resolve deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    // key -> (count, first-seen rank)
    counts: HashMap<String, (usize, usize)>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        let rank = self.counts.len();
        match self.counts.get_mut(key) {
            Some((count, _)) => *count += 1,
            None => {
                self.counts.insert(key.to_owned(), (1, rank));
            }
        }
    }

    pub fn count(&self, key: &str) -> usize {
        self.counts.get(key).map(|(c, _)| *c).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Fold in the counts of a table built from a later partition of the
    /// same input. Keys new to `self` rank after every key already in it.
    pub fn merge(&mut self, other: FrequencyTable) {
        let mut incoming: Vec<_> = other.counts.into_iter().collect();
        incoming.sort_by_key(|(_, (_, rank))| *rank);

        for (key, (count, _)) in incoming {
            let rank = self.counts.len();
            match self.counts.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().0 += count,
                Entry::Vacant(e) => {
                    e.insert((count, rank));
                }
            }
        }
    }

    /// The `n` most frequent keys, count descending, ties by first appearance.
    pub fn top(&self, n: usize) -> TopN {
        let mut rows: Vec<(&String, usize, usize)> = self
            .counts
            .iter()
            .map(|(key, (count, rank))| (key, *count, *rank))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        rows.truncate(n);
        rows.into_iter()
            .map(|(key, count, _)| (key.clone(), count))
            .collect()
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for key in iter {
            table.add(key);
        }
        table
    }
}

// ── Top-N ──────────────────────────────────────────────────────────────────

/// Top `n` values of an arbitrary record field.
pub fn top_by<'a, F>(records: &'a [LogRecord], n: usize, key: F) -> TopN
where
    F: Fn(&'a LogRecord) -> &'a str,
{
    records.iter().map(key).collect::<FrequencyTable>().top(n)
}

pub fn top_clients(records: &[LogRecord], n: usize) -> TopN {
    top_by(records, n, |r| r.client_ip.as_str())
}

pub fn top_urls(records: &[LogRecord], n: usize) -> TopN {
    top_by(records, n, |r| r.url.as_str())
}

// ── Distributions ──────────────────────────────────────────────────────────

pub fn status_distribution(records: &[LogRecord]) -> BTreeMap<u16, usize> {
    records.iter().fold(BTreeMap::new(), |mut map, r| {
        *map.entry(r.status).or_insert(0) += 1;
        map
    })
}

/// Requests per hour, keyed `YYYY-MM-DD HH:00`.
///
/// Only the native log timestamp form is accepted here; records whose
/// timestamp does not parse are left out.
pub fn hourly_volume(records: &[LogRecord]) -> BTreeMap<String, usize> {
    bucket_by(records, "%Y-%m-%d %H:00")
}

/// Requests per day, keyed `YYYY-MM-DD`.
pub fn daily_volume(records: &[LogRecord]) -> BTreeMap<String, usize> {
    bucket_by(records, "%Y-%m-%d")
}

fn bucket_by(records: &[LogRecord], label_format: &str) -> BTreeMap<String, usize> {
    let mut buckets = BTreeMap::new();
    for record in records {
        match timestamp::parse_native(&record.timestamp_raw) {
            Some(dt) => *buckets.entry(dt.format(label_format).to_string()).or_insert(0) += 1,
            None => tracing::trace!("unbucketable timestamp {:?}", record.timestamp_raw),
        }
    }
    buckets
}

// ── User agents ────────────────────────────────────────────────────────────

/// Classify a whole user-agent string. Bot tokens take precedence over
/// browser tokens, so crawlers that claim `Mozilla/5.0` still count as bots.
pub fn classify(user_agent: &str) -> UserAgentClass {
    classify_lowercase(&user_agent.to_lowercase())
}

fn classify_lowercase(ua: &str) -> UserAgentClass {
    if BOT_TOKENS.iter().any(|t| ua.contains(t)) {
        UserAgentClass::Bot
    } else if BROWSER_TOKENS.iter().any(|t| ua.contains(t)) {
        UserAgentClass::Browser
    } else {
        UserAgentClass::Unknown
    }
}

pub fn classify_user_agents(records: &[LogRecord]) -> UserAgentClasses {
    let mut classes = UserAgentClasses::default();
    for record in records {
        let ua = record.user_agent.to_lowercase();
        let class = classify_lowercase(&ua);
        *classes.get_mut(class).entry(ua).or_insert(0) += 1;
    }
    classes
}

// ── Summary ────────────────────────────────────────────────────────────────

pub fn summarize(records: &[LogRecord], top_n: usize) -> Summary {
    let unique_clients = records
        .iter()
        .map(|r| r.client_ip.as_str())
        .collect::<HashSet<_>>()
        .len();

    Summary {
        total_requests: records.len(),
        unique_clients,
        top_clients: top_clients(records, top_n),
        top_urls: top_urls(records, top_n),
        status_distribution: status_distribution(records),
        hourly_volume: hourly_volume(records),
        daily_volume: daily_volume(records),
        user_agents: classify_user_agents(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseSize;

    fn record(ip: &str, url: &str, status: u16, ts: &str, ua: &str) -> LogRecord {
        LogRecord {
            client_ip: ip.into(),
            timestamp_raw: ts.into(),
            method: "GET".into(),
            url: url.into(),
            status,
            size: ResponseSize::Bytes("100".into()),
            referrer: "-".into(),
            user_agent: ua.into(),
        }
    }

    fn sample() -> Vec<LogRecord> {
        let ts = "15/Jan/2025:14:05:00 +0200";
        vec![
            record("10.0.0.3", "/c", 200, ts, "curl/7.68.0"),
            record("10.0.0.1", "/a", 200, ts, "Mozilla/5.0"),
            record("10.0.0.2", "/b", 404, ts, "Mozilla/5.0"),
            record("10.0.0.1", "/a", 200, ts, "Googlebot/2.1"),
            record("10.0.0.2", "/b", 200, ts, "Mozilla/5.0"),
        ]
    }

    #[test]
    fn top_clients_breaks_ties_by_first_appearance() {
        let top = top_clients(&sample(), DEFAULT_TOP_N);
        assert_eq!(
            top,
            vec![
                ("10.0.0.1".to_owned(), 2),
                ("10.0.0.2".to_owned(), 2),
                ("10.0.0.3".to_owned(), 1),
            ]
        );
    }

    #[test]
    fn top_n_truncates() {
        let records = sample();
        assert_eq!(top_urls(&records, 1), vec![("/a".to_owned(), 2)]);
        assert!(top_urls(&records, 0).is_empty());
        assert!(top_urls(&[], 5).is_empty());
    }

    #[test]
    fn top_n_is_sorted_and_bounded() {
        let records = sample();
        for n in 1..=6 {
            let top = top_clients(&records, n);
            assert!(top.len() <= n);
            assert!(top.len() <= 3);
            assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }

    #[test]
    fn status_counts() {
        let ts = "15/Jan/2025:14:05:00 +0200";
        let records = vec![
            record("1.1.1.1", "/", 200, ts, ""),
            record("1.1.1.1", "/", 200, ts, ""),
            record("1.1.1.1", "/", 404, ts, ""),
        ];
        let dist = status_distribution(&records);
        assert_eq!(dist, BTreeMap::from([(200, 2), (404, 1)]));
    }

    #[test]
    fn hourly_buckets_zero_minutes() {
        let records = vec![
            record("1.1.1.1", "/", 200, "15/Jan/2025:14:05:00 +0200", ""),
            record("1.1.1.1", "/", 200, "15/Jan/2025:14:55:00 +0200", ""),
            record("1.1.1.1", "/", 200, "15/Jan/2025:15:00:00 +0200", ""),
            record("1.1.1.1", "/", 200, "2025-01-15 14:10:00", ""),
        ];
        let hourly = hourly_volume(&records);
        assert_eq!(hourly.get("2025-01-15 14:00"), Some(&2));
        assert_eq!(hourly.get("2025-01-15 15:00"), Some(&1));
        assert_eq!(hourly.len(), 2);

        let daily = daily_volume(&records);
        assert_eq!(daily, BTreeMap::from([("2025-01-15".to_owned(), 3)]));
    }

    #[test]
    fn bots_win_over_browsers() {
        let googlebot = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
        assert_eq!(classify(googlebot), UserAgentClass::Bot);
        assert_eq!(classify("Baiduspider"), UserAgentClass::Bot);
        assert_eq!(classify("SomeCRAWLER"), UserAgentClass::Bot);
        assert_eq!(classify("Mozilla/5.0 Chrome/91"), UserAgentClass::Browser);
        assert_eq!(classify("curl/7.68.0"), UserAgentClass::Unknown);
        assert_eq!(classify(""), UserAgentClass::Unknown);
    }

    #[test]
    fn user_agents_keyed_lowercase() {
        let classes = classify_user_agents(&sample());
        assert_eq!(classes.browsers.get("mozilla/5.0"), Some(&3));
        assert_eq!(classes.bots.get("googlebot/2.1"), Some(&1));
        assert_eq!(classes.unknown.get("curl/7.68.0"), Some(&1));
    }

    #[test]
    fn merged_partitions_rank_like_a_single_pass() {
        let records = sample();
        let (left, right) = records.split_at(2);

        let mut merged: FrequencyTable = left.iter().map(|r| r.client_ip.as_str()).collect();
        merged.merge(right.iter().map(|r| r.client_ip.as_str()).collect());

        assert_eq!(merged.top(5), top_clients(&records, 5));
        assert_eq!(merged.count("10.0.0.2"), 2);
    }

    #[test]
    fn merge_can_promote_entries_outside_partition_top_n() {
        let left: FrequencyTable = ["a", "a", "b", "c"].into_iter().collect();
        let right: FrequencyTable = ["c", "c", "d"].into_iter().collect();
        assert_eq!(left.top(1), vec![("a".to_owned(), 2)]);

        let mut merged = left;
        merged.merge(right);
        assert_eq!(merged.top(1), vec![("c".to_owned(), 3)]);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn summary_totals() {
        let summary = summarize(&sample(), 2);
        assert_eq!(summary.total_requests, 5);
        assert_eq!(summary.unique_clients, 3);
        assert_eq!(summary.top_clients.len(), 2);
        assert_eq!(summary.daily_volume.get("2025-01-15"), Some(&5));
    }
}
