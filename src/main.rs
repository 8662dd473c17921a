use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use logsight::{
    analytics, config::AppConfig, filter, generator, loader, report, AppState, FilterCriteria,
    FilterParams,
};

#[derive(Parser)]
#[command(name = "logsight", version, about = "Access log analytics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the analytics dashboard over HTTP
    Serve {
        /// Log file to analyse (defaults to LOG_PATH)
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Write a Markdown report for a log file
    Report {
        #[arg(long)]
        log: Option<PathBuf>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the report instead of saving it
        #[arg(long)]
        stdout: bool,
    },
    /// Generate a synthetic access log
    Generate {
        /// Number of lines to write
        #[arg(long, default_value_t = 100_000)]
        lines: usize,
        /// Number of days the traffic is spread over
        #[arg(long, default_value_t = 30)]
        days: usize,
        /// First day of traffic, YYYY-MM-DD
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Base name of the output file
        #[arg(long, default_value = "sample")]
        name: String,
        /// Output directory
        #[arg(long, default_value = "logs")]
        dir: PathBuf,
    },
    /// Print the first parsed records of a log
    Preview {
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(short = 'n', long, default_value_t = 5)]
        lines: usize,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// HTTP method, or "all"
    #[arg(long)]
    method: Option<String>,
    /// Status code, or "all"
    #[arg(long)]
    status: Option<String>,
    /// Inclusive start date, YYYY-MM-DD
    #[arg(long)]
    start_date: Option<String>,
    /// Inclusive end date, YYYY-MM-DD
    #[arg(long)]
    end_date: Option<String>,
}

impl From<FilterArgs> for FilterParams {
    fn from(a: FilterArgs) -> Self {
        FilterParams {
            method: a.method,
            status: a.status,
            start_date: a.start_date,
            end_date: a.end_date,
        }
    }
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env; a missing file is fine, env vars may already be set
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logsight=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Command::Serve { log } => {
            if let Some(log) = log {
                config.log_path = log;
            }
            serve(config).await
        }
        Command::Report {
            log,
            filters,
            stdout,
        } => {
            let log = log.unwrap_or(config.log_path);
            let records = loader::load(&log)?;
            let criteria = FilterCriteria::from(FilterParams::from(filters));
            let records = filter(&records, &criteria);
            let summary = analytics::summarize(&records, config.top_n);

            if stdout {
                let now = chrono::Local::now().naive_local();
                let name = log.display().to_string();
                println!("{}", report::render_markdown(&summary, Some(name.as_str()), now));
            } else {
                let path = report::write_report(&config.reports_dir, &summary, Some(log.as_path()))?;
                println!("Report saved to {}", path.display());
            }
            Ok(())
        }
        Command::Generate {
            lines,
            days,
            start,
            name,
            dir,
        } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            let path = dir.join(generator::file_name(&name));
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);

            tracing::info!("Generating {} lines over {} days", lines, days);
            let mut log_gen = generator::LogGenerator::new(rand::thread_rng());
            let written = log_gen.generate(
                &mut out,
                lines,
                days,
                start.unwrap_or_else(generator::default_start),
            )?;
            out.flush()?;

            println!("Wrote {} lines to {}", written, path.display());
            Ok(())
        }
        Command::Preview { log, lines } => {
            let log = log.unwrap_or(config.log_path);
            for record in loader::load(&log)?.iter().take(lines) {
                println!("{record:?}");
            }
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting logsight on {}", config.bind_addr());
    tracing::info!("Analysing {}", config.log_path.display());

    let bind_addr = config.bind_addr();
    let state = Arc::new(AppState::new(config));
    let app = logsight::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
