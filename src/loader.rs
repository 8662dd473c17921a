use crate::{
    error::{LogError, Result},
    models::LogCollection,
    parser::parse_line,
};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Read `path` and parse every line, keeping file order.
///
/// Lines that fail the grammar or are not valid UTF-8 are skipped; the scan
/// always continues to the end of the file. Only opening or reading the file
/// itself can fail.
pub fn load(path: impl AsRef<Path>) -> Result<LogCollection> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LogError::read(path, e))?;
    let records = read_records(BufReader::new(file)).map_err(|e| LogError::read(path, e))?;

    tracing::info!("Loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Parse an in-memory log, e.g. an uploaded file or a test fixture.
pub fn parse_str(contents: &str) -> LogCollection {
    contents.lines().filter_map(parse_line).collect()
}

fn read_records(mut reader: impl BufRead) -> std::io::Result<LogCollection> {
    let mut records = LogCollection::new();
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    let mut skipped = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(s) => s.trim_end_matches(['\n', '\r']),
            Err(_) => {
                tracing::debug!("line {}: not valid UTF-8, skipping", line_no);
                skipped += 1;
                continue;
            }
        };

        match parse_line(line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} unparsable line(s) of {}", skipped, line_no);
    }
    Ok(records)
}
