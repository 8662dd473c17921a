//! Synthetic combined-format access logs for demos and load testing.
//!
//! Every emitted line matches the parser grammar.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rand::{
    distributions::{Distribution, WeightedIndex},
    seq::SliceRandom,
    Rng,
};
use std::io::{self, Write};

const IP_PREFIXES: &[&str] = &[
    "66.249.76.",
    "40.77.167.",
    "157.55.39.",
    "192.168.1.",
    "10.0.0.",
    "203.0.113.",
    "198.51.100.",
    "185.199.108.",
    "151.101.193.",
    "172.217.14.",
];

const METHODS: &[(&str, u32)] = &[("GET", 80), ("POST", 15), ("PUT", 2), ("DELETE", 1), ("HEAD", 2)];

const PATHS: &[(&str, u32)] = &[
    ("/", 20),
    ("/index.html", 15),
    ("/about", 8),
    ("/contact", 5),
    ("/api/users", 10),
    ("/api/data", 12),
    ("/login", 6),
    ("/dashboard", 8),
    ("/products", 7),
    ("/favicon.ico", 15),
    ("/robots.txt", 3),
    ("/sitemap.xml", 2),
    ("/2025/01/14/new-year-updates/", 1),
    ("/2025/02/15/machine-learning-tutorial/", 1),
    ("/2025/03/20/web-development-best-practices/", 1),
    ("/assets/css/style.css", 5),
    ("/assets/js/main.js", 4),
    ("/images/logo.png", 3),
    ("/admin/login", 1),
    ("/wp-admin/", 1),
];

const STATUSES: &[(u16, u32)] = &[
    (200, 70),
    (404, 15),
    (301, 5),
    (302, 3),
    (403, 2),
    (500, 2),
    (304, 2),
    (401, 1),
];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.92 Mobile Safari/537.36 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
    "Mozilla/5.0 (compatible; bingbot/2.0; +http://www.bing.com/bingbot.htm)",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-G981B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36",
    "curl/7.68.0",
    "python-requests/2.25.1",
];

const REFERRERS: &[&str] = &[
    "-",
    "https://www.google.com/",
    "https://www.bing.com/",
    "https://github.com/",
    "https://stackoverflow.com/",
    "https://reddit.com/",
    "https://twitter.com/",
    "https://facebook.com/",
];

/// Default first day of generated traffic.
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 9, 1).unwrap_or_default()
}

/// Weighted picker over a constant table.
struct Weighted<T: 'static> {
    items: &'static [(T, u32)],
    index: WeightedIndex<u32>,
}

impl<T: Copy + 'static> Weighted<T> {
    fn new(items: &'static [(T, u32)]) -> Self {
        let index = WeightedIndex::new(items.iter().map(|(_, w)| *w))
            .expect("weight tables are non-empty with positive weights");
        Self { items, index }
    }

    fn pick(&self, rng: &mut impl Rng) -> T {
        self.items[self.index.sample(rng)].0
    }
}

pub struct LogGenerator<R: Rng> {
    rng: R,
    methods: Weighted<&'static str>,
    paths: Weighted<&'static str>,
    statuses: Weighted<u16>,
}

impl<R: Rng> LogGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            methods: Weighted::new(METHODS),
            paths: Weighted::new(PATHS),
            statuses: Weighted::new(STATUSES),
        }
    }

    /// Split `total` requests over `days` days: weekdays get 80–120% of the
    /// base rate, weekends 60–90%, and one day in ten spikes to 150–200%.
    /// The result always sums to `total`.
    pub fn daily_distribution(&mut self, total: usize, days: usize) -> Vec<usize> {
        if days == 0 {
            return Vec::new();
        }
        let base = (total / days) as f64;
        let mut daily: Vec<usize> = (0..days)
            .map(|day| {
                let multiplier = if self.rng.gen_bool(0.1) {
                    self.rng.gen_range(1.5..2.0)
                } else if matches!(day % 7, 5 | 6) {
                    self.rng.gen_range(0.6..0.9)
                } else {
                    self.rng.gen_range(0.8..1.2)
                };
                (base * multiplier) as usize
            })
            .collect();

        let mut current: usize = daily.iter().sum();
        while current < total {
            daily[self.rng.gen_range(0..days)] += 1;
            current += 1;
        }
        while current > total {
            let day = self.rng.gen_range(0..days);
            if daily[day] > 0 {
                daily[day] -= 1;
                current -= 1;
            }
        }
        daily
    }

    fn ip(&mut self) -> String {
        let prefix = IP_PREFIXES.choose(&mut self.rng).copied().unwrap_or("10.0.0.");
        format!("{prefix}{}", self.rng.gen_range(1..=254))
    }

    fn size_for(&mut self, method: &str, path: &str, status: u16) -> u32 {
        let range = if matches!(status, 401 | 403 | 404) {
            200..=1000
        } else if matches!(path, "/favicon.ico" | "/robots.txt") {
            100..=2000
        } else if path.ends_with(".css") || path.ends_with(".js") {
            5000..=50000
        } else if path.ends_with(".png") || path.ends_with(".jpg") || path.ends_with(".gif") {
            10000..=200000
        } else if method == "POST" {
            500..=5000
        } else {
            1000..=20000
        };
        self.rng.gen_range(range)
    }

    /// One complete log line for a request at some point during `day`.
    pub fn line(&mut self, day: NaiveDateTime) -> String {
        let ip = self.ip();
        let at = day + Duration::seconds(self.rng.gen_range(0..=86_400));
        let method = self.methods.pick(&mut self.rng);
        let path = self.paths.pick(&mut self.rng);
        let status = self.statuses.pick(&mut self.rng);
        let size = self.size_for(method, path, status);
        let referrer = REFERRERS.choose(&mut self.rng).copied().unwrap_or("-");
        let agent = USER_AGENTS.choose(&mut self.rng).copied().unwrap_or("-");

        format!(
            "{ip} - - [{}] \"{method} {path} HTTP/1.1\" {status} {size} \"{referrer}\" \"{agent}\"",
            at.format("%d/%b/%Y:%H:%M:%S +0200"),
        )
    }

    /// Write `total` lines spread over `days` days starting at `start`.
    /// Returns the number of lines written.
    pub fn generate<W: Write>(
        &mut self,
        out: &mut W,
        total: usize,
        days: usize,
        start: NaiveDate,
    ) -> io::Result<usize> {
        let mut written = 0usize;
        let daily = self.daily_distribution(total, days);
        for (offset, count) in daily.into_iter().enumerate() {
            let day = (start + Duration::days(offset as i64)).and_time(Default::default());
            for _ in 0..count {
                writeln!(out, "{}", self.line(day))?;
                written += 1;
                if written % 10_000 == 0 {
                    tracing::debug!("Generated {} lines", written);
                }
            }
        }
        Ok(written)
    }
}

/// Timestamped output name, e.g. `sample_2025_01_15_14_30_45.log`.
pub fn file_name(base: &str) -> String {
    format!("{base}_{}.log", Local::now().format("%Y_%m_%d_%H_%M_%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{loader::parse_str, parser::parse_line};
    use rand::{rngs::StdRng, SeedableRng};

    fn generator() -> LogGenerator<StdRng> {
        LogGenerator::new(StdRng::seed_from_u64(7))
    }

    #[test]
    fn distribution_sums_to_total() {
        let mut g = generator();
        for (total, days) in [(1000, 30), (7, 3), (0, 5), (100, 1)] {
            let daily = g.daily_distribution(total, days);
            assert_eq!(daily.len(), days);
            assert_eq!(daily.iter().sum::<usize>(), total);
        }
        assert!(g.daily_distribution(10, 0).is_empty());
    }

    #[test]
    fn every_line_parses() {
        let mut g = generator();
        let day = default_start().and_hms_opt(0, 0, 0).unwrap();
        for _ in 0..200 {
            let line = g.line(day);
            assert!(parse_line(&line).is_some(), "unparsable: {line}");
        }
    }

    #[test]
    fn generate_writes_requested_lines() {
        let mut g = generator();
        let mut buf = Vec::new();
        let written = g.generate(&mut buf, 250, 5, default_start()).unwrap();
        assert_eq!(written, 250);

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(parse_str(&text).len(), 250);
    }

    #[test]
    fn file_name_shape() {
        let name = file_name("sample");
        assert!(name.starts_with("sample_"));
        assert!(name.ends_with(".log"));
    }
}
