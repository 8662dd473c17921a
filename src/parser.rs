//! Combined log format line grammar.
//!
//! ```text
//! IP - - [DATETIME] "METHOD URL HTTP/X.Y" STATUS SIZE "REFERRER" "USER_AGENT"
//! ```
//!
//! The pattern is anchored at the start of the line only, so trailing fields
//! some servers append (e.g. `X-Forwarded-For`) are ignored.

use crate::models::{LogRecord, ResponseSize};
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<ip>[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+)\s-\s-\s",
        r"\[(?P<datetime>[^\]]+)\]\s",
        r#""(?P<method>\w+)\s(?P<url>\S+)\sHTTP/[0-9]\.[0-9]"\s"#,
        r"(?P<status>[0-9]{3})\s(?P<size>[0-9]+|-)\s",
        r#""(?P<referrer>[^"]*)"\s"(?P<user_agent>[^"]*)""#,
    ))
    .expect("log line pattern is valid")
});

/// Match one raw line against the grammar.
///
/// Returns `None` for anything that does not match in full; foreign or
/// truncated lines are not an error.
pub fn parse_line(line: &str) -> Option<LogRecord> {
    let caps = LINE_PATTERN.captures(line)?;

    // Three ASCII digits always fit in a u16.
    let status = caps["status"].parse::<u16>().ok()?;
    let size = match &caps["size"] {
        "-" => ResponseSize::Unknown,
        digits => ResponseSize::Bytes(digits.to_owned()),
    };

    Some(LogRecord {
        client_ip: caps["ip"].to_owned(),
        timestamp_raw: caps["datetime"].to_owned(),
        method: caps["method"].to_owned(),
        url: caps["url"].to_owned(),
        status,
        size,
        referrer: caps["referrer"].to_owned(),
        user_agent: caps["user_agent"].to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] "GET /index.html HTTP/1.1" 200 1024 "-" "Mozilla/5.0""#;

    #[test]
    fn parses_every_field() {
        let record = parse_line(LINE).unwrap();
        assert_eq!(record.client_ip, "203.0.113.5");
        assert_eq!(record.timestamp_raw, "15/Jan/2025:14:30:45 +0200");
        assert_eq!(record.method, "GET");
        assert_eq!(record.url, "/index.html");
        assert_eq!(record.status, 200);
        assert_eq!(record.size, ResponseSize::Bytes("1024".into()));
        assert_eq!(record.size.bytes(), Some(1024));
        assert_eq!(record.referrer, "-");
        assert_eq!(record.referrer_url(), None);
        assert_eq!(record.user_agent, "Mozilla/5.0");
    }

    #[test]
    fn keeps_dash_size() {
        let line = r#"10.0.0.7 - - [01/Sep/2020:00:00:01 +0200] "HEAD / HTTP/1.0" 304 - "https://github.com/" """#;
        let record = parse_line(line).unwrap();
        assert_eq!(record.size, ResponseSize::Unknown);
        assert_eq!(record.size.to_string(), "-");
        assert_eq!(record.referrer, "https://github.com/");
        assert_eq!(record.user_agent, "");
    }

    #[test]
    fn size_digits_are_verbatim() {
        let with_size = |size: &str| {
            format!(r#"10.0.0.7 - - [01/Sep/2020:00:00:01 +0200] "GET / HTTP/1.1" 200 {size} "-" "ua""#)
        };

        let padded = parse_line(&with_size("000512")).unwrap();
        assert_eq!(padded.size.to_string(), "000512");
        assert_eq!(padded.size.bytes(), Some(512));

        let huge = parse_line(&with_size("99999999999999999999999")).unwrap();
        assert_eq!(huge.size.to_string(), "99999999999999999999999");
        assert_eq!(huge.size.bytes(), None);
    }

    #[test]
    fn ignores_trailing_fields() {
        let line = format!("{LINE} \"198.51.100.1\"");
        assert_eq!(parse_line(&line), parse_line(LINE));
    }

    #[test]
    fn rejects_non_conforming_lines() {
        let bad = [
            "",
            "not a log line",
            // missing quotes around the request
            r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] GET /index.html HTTP/1.1 200 1024 "-" "ua""#,
            // truncated status
            r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] "GET / HTTP/1.1" 20 1024 "-" "ua""#,
            // whitespace inside the URL
            r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] "GET /a b HTTP/1.1" 200 1024 "-" "ua""#,
            // missing user agent
            r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] "GET / HTTP/1.1" 200 1024 "-""#,
            // hostname instead of dotted quad
            r#"example.com - - [15/Jan/2025:14:30:45 +0200] "GET / HTTP/1.1" 200 1024 "-" "ua""#,
            // two-digit protocol version
            r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] "GET / HTTP/10.1" 200 1024 "-" "ua""#,
        ];
        for line in bad {
            assert!(parse_line(line).is_none(), "should not parse: {line}");
        }
    }
}
