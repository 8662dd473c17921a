use crate::{
    analytics,
    error::LogError,
    filter::{filter, FilterCriteria, FilterParams},
    models::{Summary, UserAgentClass},
    report, AppState,
};
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::{collections::HashMap, sync::Arc};

const METHOD_CHOICES: &[&str] = &["GET", "POST", "PUT", "DELETE", "HEAD"];

// ── Template structs ───────────────────────────────────────────────────────

/// One row of a bar table: label, count and width as a share of the largest row.
pub struct Bar {
    pub label: String,
    pub count: usize,
    pub pct: usize,
}

/// A titled bar table on the dashboard.
pub struct Section {
    pub title: &'static str,
    pub rows: Vec<Bar>,
}

pub struct MethodOption {
    pub name: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    log_name: String,
    summary: Summary,
    params: EchoedParams,
    methods: Vec<MethodOption>,
    sections: Vec<Section>,
}

/// Rendered Markdown report. `body` is HTML produced from our own Markdown.
#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate {
    log_name: String,
    body: String,
}

/// Filter values written back into the form so the current view is visible.
struct EchoedParams {
    method: String,
    status: String,
    start_date: String,
    end_date: String,
}

impl From<&FilterParams> for EchoedParams {
    fn from(p: &FilterParams) -> Self {
        let text = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_owned();
        Self {
            method: text(&p.method),
            status: text(&p.status),
            start_date: text(&p.start_date),
            end_date: text(&p.end_date),
        }
    }
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET /
/// HTML dashboard for the configured log, narrowed by the query filters.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Response {
    let echoed = EchoedParams::from(&params);
    let summary = match summarize(&state, params).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let methods = METHOD_CHOICES
        .iter()
        .map(|&name| MethodOption {
            name,
            selected: echoed.method == name,
        })
        .collect();

    DashboardTemplate {
        log_name: state.config.log_path.display().to_string(),
        params: echoed,
        methods,
        sections: sections(&summary),
        summary,
    }
    .into_response()
}

/// GET /api/summary
/// The same summary as JSON.
pub async fn summary_json(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Response {
    match summarize(&state, params).await {
        Ok(summary) => Json(summary).into_response(),
        Err(resp) => resp,
    }
}

/// GET /report
/// The Markdown report for the filtered view, rendered as HTML.
pub async fn report_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Response {
    let summary = match summarize(&state, params).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let log_name = state.config.log_path.display().to_string();
    let generated_at = chrono::Local::now().naive_local();
    let markdown = report::render_markdown(&summary, Some(log_name.as_str()), generated_at);

    ReportTemplate {
        body: report::render_html(&markdown),
        log_name,
    }
    .into_response()
}

// ── Private helpers ────────────────────────────────────────────────────────

/// Load (or reuse) the configured log, apply the filters and aggregate. All
/// of it is blocking work, so it runs off the async executor.
async fn summarize(state: &Arc<AppState>, params: FilterParams) -> Result<Summary, Response> {
    let cache = state.cache.clone();
    let path = state.config.log_path.clone();
    let top_n = state.config.top_n;
    let criteria = FilterCriteria::from(params);

    let joined = tokio::task::spawn_blocking(move || {
        let records = cache.load(&path)?;
        let summary = if criteria.is_empty() {
            analytics::summarize(&records, top_n)
        } else {
            analytics::summarize(&filter(&records, &criteria), top_n)
        };
        Ok::<_, LogError>(summary)
    })
    .await;

    match joined {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(e @ LogError::NotFound { .. })) => {
            tracing::warn!("{}", e);
            Err((StatusCode::NOT_FOUND, "Log file not found.").into_response())
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to load log: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to load log.").into_response())
        }
        Err(e) => {
            tracing::error!("Summary task failed: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Failed to load log.").into_response())
        }
    }
}

fn sections(summary: &Summary) -> Vec<Section> {
    let agents = &summary.user_agents;
    let section = |title, rows| Section { title, rows };
    vec![
        section(
            "Hourly Request Volume",
            bars(summary.hourly_volume.iter().map(|(k, c)| (k.clone(), *c))),
        ),
        section(
            "Daily Request Volume",
            bars(summary.daily_volume.iter().map(|(k, c)| (k.clone(), *c))),
        ),
        section(
            "Status Code Distribution",
            bars(
                summary
                    .status_distribution
                    .iter()
                    .map(|(k, c)| (k.to_string(), *c)),
            ),
        ),
        section("Top IPs", bars(summary.top_clients.iter().cloned())),
        section("Top URLs", bars(summary.top_urls.iter().cloned())),
        section("Top Bots", bars(top_agents(agents.get(UserAgentClass::Bot)))),
        section(
            "Top Browsers",
            bars(top_agents(agents.get(UserAgentClass::Browser))),
        ),
        section(
            "Unknown Agents",
            bars(top_agents(agents.get(UserAgentClass::Unknown))),
        ),
    ]
}

/// Five most common agents, count descending.
fn top_agents(data: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut rows: Vec<(String, usize)> = data.iter().map(|(k, c)| (k.clone(), *c)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.truncate(5);
    rows
}

/// Attach a bar width relative to the largest count.
fn bars(items: impl IntoIterator<Item = (String, usize)>) -> Vec<Bar> {
    let items: Vec<_> = items.into_iter().collect();
    let max = items.iter().map(|(_, c)| *c).max().unwrap_or(0);
    items
        .into_iter()
        .map(|(label, count)| {
            let pct = if max > 0 { count * 100 / max } else { 0 };
            Bar { label, count, pct }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_widths_scale_to_largest() {
        let rows = bars(vec![("a".into(), 4), ("b".into(), 1), ("c".into(), 0)]);
        let pcts: Vec<_> = rows.iter().map(|b| b.pct).collect();
        assert_eq!(pcts, [100, 25, 0]);
        assert!(bars(Vec::new()).is_empty());
    }

    #[test]
    fn top_agents_caps_at_five() {
        let data: HashMap<String, usize> = (0..8).map(|i| (format!("agent{i}"), i)).collect();
        let top = top_agents(&data);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], ("agent7".to_owned(), 7));
    }
}
