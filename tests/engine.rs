//! End-to-end checks of the parse → filter → aggregate pipeline against
//! files on disk.

use logsight::{
    analytics::{self, DEFAULT_TOP_N},
    filter::StatusFilter,
    filter, load, FilterCriteria, FilterParams, LogError, ResponseSize,
};
use std::{collections::BTreeMap, io::Write};
use tempfile::NamedTempFile;

const ACCESS_LOG: &str = r#"203.0.113.5 - - [15/Jan/2025:14:30:45 +0200] "GET /index.html HTTP/1.1" 200 1024 "-" "Mozilla/5.0"
66.249.76.10 - - [15/Jan/2025:14:55:00 +0200] "GET /robots.txt HTTP/1.1" 200 310 "-" "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"
this line is noise
198.51.100.7 - - [15/Jan/2025:15:02:11 +0200] "POST /login HTTP/1.1" 302 - "https://www.google.com/" "Mozilla/5.0 (Windows NT 10.0) Chrome/91.0 Safari/537.36"
203.0.113.5 - - [16/Jan/2025:09:00:00 +0200] "GET /missing HTTP/1.1" 404 128 "-" "curl/7.68.0"
203.0.113.5 - - [16/Jan/2025:09:10:00 +0200] "GET /index.html HTTP/1.1" 200 1024 "-" "Mozilla/5.0"
"#;

fn write_log(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn load_skips_noise_and_keeps_order() {
    let file = write_log(ACCESS_LOG);
    let records = load(file.path()).unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(records[0].client_ip, "203.0.113.5");
    assert_eq!(records[0].size, ResponseSize::Bytes("1024".into()));
    assert_eq!(records[2].size, ResponseSize::Unknown);
    assert_eq!(records[2].referrer_url(), Some("https://www.google.com/"));
    assert_eq!(records[4].url, "/index.html");
}

#[test]
fn load_of_only_garbage_is_empty_not_an_error() {
    let file = write_log("garbage\n\"GET / HTTP/1.1\" 200\n1.2.3.4 - - [x] \"GET / HTTP/1.1\" 2000 1 \"-\" \"-\"\n");
    assert!(load(file.path()).unwrap().is_empty());

    let empty = write_log("");
    assert!(load(empty.path()).unwrap().is_empty());
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(dir.path().join("absent.log")).unwrap_err();
    assert!(matches!(err, LogError::NotFound { .. }));
    assert!(err.to_string().contains("absent.log"));
}

#[test]
fn filtered_summary() {
    let file = write_log(ACCESS_LOG);
    let records = load(file.path()).unwrap();

    let get_200 = FilterCriteria::from(FilterParams {
        method: Some("GET".into()),
        status: Some("200".into()),
        ..Default::default()
    });
    assert_eq!(get_200.status, Some(StatusFilter::Code(200)));

    let subset = filter(&records, &get_200);
    let summary = analytics::summarize(&subset, DEFAULT_TOP_N);
    assert_eq!(summary.total_requests, 3);
    assert_eq!(
        summary.top_urls,
        vec![("/index.html".to_owned(), 2), ("/robots.txt".to_owned(), 1)]
    );
    assert_eq!(summary.hourly_volume.get("2025-01-15 14:00"), Some(&2));
    assert_eq!(summary.user_agents.bots.len(), 1);
}

#[test]
fn day_range_then_aggregate() {
    let file = write_log(ACCESS_LOG);
    let records = load(file.path()).unwrap();

    let day_two = FilterCriteria::from(FilterParams {
        start_date: Some("2025-01-16".into()),
        end_date: Some("2025-01-16".into()),
        ..Default::default()
    });
    let subset = filter(&records, &day_two);
    assert_eq!(subset.len(), 2);
    assert_eq!(
        analytics::status_distribution(&subset),
        BTreeMap::from([(200, 1), (404, 1)])
    );
    assert_eq!(
        analytics::top_clients(&subset, 3),
        vec![("203.0.113.5".to_owned(), 2)]
    );
    // the source collection is untouched
    assert_eq!(records.len(), 5);
}
