use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures that surface to callers of the engine.
///
/// Unparsable lines and timestamps are skipped, not reported; only I/O can
/// fail a load or a report write.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LogError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            LogError::NotFound { path }
        } else {
            LogError::Read { path, source }
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Write {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogError>;
