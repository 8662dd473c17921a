use crate::{
    error::{LogError, Result},
    loader,
    models::LogRecord,
};
use dashmap::DashMap;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

#[derive(Debug)]
struct CachedLog {
    modified: Option<SystemTime>,
    records: Arc<Vec<LogRecord>>,
}

/// Thread-safe cache mapping a log file path -> its parsed records.
///
/// An entry is reused while the file's modification time is unchanged, so
/// dashboard requests only pay for parsing after the log has been written to.
#[derive(Clone, Debug, Default)]
pub struct LogCache {
    inner: Arc<DashMap<PathBuf, CachedLog>>,
}

impl LogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the records for `path`, re-parsing if the file changed.
    ///
    /// This does blocking file I/O; async callers should run it on
    /// `spawn_blocking`.
    pub fn load(&self, path: &Path) -> Result<Arc<Vec<LogRecord>>> {
        let modified = match std::fs::metadata(path) {
            Ok(meta) => meta.modified().ok(),
            Err(e) => {
                // Rotated away or unreadable: never serve the stale entry.
                self.inner.remove(path);
                return Err(LogError::read(path, e));
            }
        };

        if let Some(entry) = self.inner.get(path) {
            if modified.is_some() && entry.modified == modified {
                return Ok(entry.records.clone());
            }
        }

        let records = Arc::new(loader::load(path)?);
        self.inner.insert(
            path.to_owned(),
            CachedLog {
                modified,
                records: records.clone(),
            },
        );
        Ok(records)
    }

    /// Number of files currently cached.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
