//! Access-log parsing and analytics.
//!
//! Raw combined-format lines go through [`parser`] and [`loader`] into a
//! [`models::LogCollection`], which [`filter`] can narrow and [`analytics`]
//! turns into summary tables. [`report`] and the [`handlers`] dashboard are
//! consumers of those summaries.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod generator;
pub mod handlers;
pub mod loader;
pub mod models;
pub mod parser;
pub mod report;
pub mod timestamp;

pub use error::LogError;
pub use filter::{filter, FilterCriteria, FilterParams};
pub use loader::load;
pub use models::{LogCollection, LogRecord, ResponseSize, Summary};
pub use parser::parse_line;

use cache::LogCache;

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub config: config::AppConfig,
    /// Parsed log files keyed by path, reused until the file changes.
    pub cache: LogCache,
}

impl AppState {
    pub fn new(config: config::AppConfig) -> Self {
        Self {
            config,
            cache: LogCache::new(),
        }
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard::dashboard))
        .route("/api/summary", get(handlers::dashboard::summary_json))
        .route("/report", get(handlers::dashboard::report_page))
        .route("/health", get(|| async { axum::http::StatusCode::OK }))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
