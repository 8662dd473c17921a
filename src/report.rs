use crate::{
    error::{LogError, Result},
    models::Summary,
};
use chrono::{Local, NaiveDateTime};
use pulldown_cmark::{html, Event, Options, Parser};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    path::{Path, PathBuf},
};

const AGENTS_PER_SECTION: usize = 5;
const MAX_AGENT_CHARS: usize = 80;

// ── Sections ───────────────────────────────────────────────────────────────

fn entry(key: impl Display, count: usize) -> String {
    format!("- `{key}`: **{count}**")
}

fn section<K: Display>(title: &str, items: impl IntoIterator<Item = (K, usize)>) -> String {
    std::iter::once(format!("### {title}"))
        .chain(items.into_iter().map(|(k, c)| entry(k, c)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn time_series(title: &str, data: &BTreeMap<String, usize>) -> String {
    section(title, data.iter().map(|(k, c)| (k, *c)))
}

/// Five most common agents, long strings shortened to keep the list readable.
fn user_agents(title: &str, data: &HashMap<String, usize>) -> String {
    let mut agents: Vec<_> = data.iter().collect();
    agents.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    agents.truncate(AGENTS_PER_SECTION);

    section(
        title,
        agents.into_iter().map(|(agent, count)| {
            let label = match agent.char_indices().nth(MAX_AGENT_CHARS) {
                Some((cut, _)) => format!("{}...", &agent[..cut]),
                None => agent.clone(),
            };
            (label, *count)
        }),
    )
}

// ── Report ─────────────────────────────────────────────────────────────────

/// Render the full Markdown report for `summary`.
pub fn render_markdown(
    summary: &Summary,
    log_name: Option<&str>,
    generated_at: NaiveDateTime,
) -> String {
    let log_info = log_name.map(|n| format!(" - {n}")).unwrap_or_default();
    let header = format!(
        "# Log Analyzer Report{log_info}\nGenerated on: `{}`\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );

    let body = [
        section("Top IPs", summary.top_clients.iter().map(|(k, c)| (k, *c))),
        section("Top URLs", summary.top_urls.iter().map(|(k, c)| (k, *c))),
        section(
            "Status Code Distribution",
            summary.status_distribution.iter().map(|(k, c)| (k, *c)),
        ),
        time_series("Hourly Request Volume", &summary.hourly_volume),
        time_series("Daily Request Volume", &summary.daily_volume),
        user_agents("Top Bots", &summary.user_agents.bots),
        user_agents("Top Browsers", &summary.user_agents.browsers),
        user_agents("Unknown Agents", &summary.user_agents.unknown),
    ]
    .join("\n\n");

    header + &body
}

/// Render a Markdown report as an HTML fragment.
///
/// Tables and footnotes are enabled, and a single newline inside a paragraph
/// becomes `<br />` so the header lines stay on separate rows.
pub fn render_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// File name for a report generated at `now`, derived from the log's stem.
pub fn report_file_name(log_path: Option<&Path>, now: NaiveDateTime) -> String {
    let stamp = now.format("%Y%m%d_%H%M%S");
    match log_path.and_then(Path::file_stem) {
        Some(stem) => format!("report_{}_{stamp}.md", stem.to_string_lossy()),
        None => format!("report_{stamp}.md"),
    }
}

/// Render and write a report into `dir`, creating it if needed. Returns the
/// path of the written file.
pub fn write_report(dir: &Path, summary: &Summary, log_path: Option<&Path>) -> Result<PathBuf> {
    let now = Local::now().naive_local();
    let log_name = log_path.map(|p| p.display().to_string());
    let report = render_markdown(summary, log_name.as_deref(), now);

    std::fs::create_dir_all(dir).map_err(|e| LogError::write(dir, e))?;
    let path = dir.join(report_file_name(log_path, now));
    std::fs::write(&path, report).map_err(|e| LogError::write(&path, e))?;

    tracing::info!("Report saved to {}", path.display());
    Ok(path)
}
