use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::analytics::DEFAULT_TOP_N;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Access log analysed by the dashboard and by default for reports,
    /// e.g. "logs/sample.log"
    pub log_path: PathBuf,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory generated Markdown reports are written to
    pub reports_dir: PathBuf,

    /// Number of entries kept in top-client / top-URL tables
    pub top_n: usize,
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let top_n = match std::env::var("TOP_N") {
            Ok(v) => v
                .parse::<usize>()
                .context("TOP_N must be a non-negative integer")?,
            Err(_) => DEFAULT_TOP_N,
        };

        Ok(Self {
            log_path: std::env::var("LOG_PATH")
                .unwrap_or_else(|_| "logs/sample.log".into())
                .into(),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            reports_dir: std::env::var("REPORTS_DIR")
                .unwrap_or_else(|_| "reports".into())
                .into(),
            top_n,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
