//! tm-task-filter CLI - list a project's tasks updated within a date range.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;
use tm_task_filter::export::{CSV_COLUMNS, write_csv_file};
use tm_task_filter::{Config, Event, FilteredRecord, RunOutcome, RunRequest, TaskFilter};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Filter Tasking Manager project tasks by last update date.
#[derive(Parser, Debug)]
#[command(name = "tm-task-filter")]
#[command(about = "Filter Tasking Manager project tasks by last update date")]
#[command(version)]
struct Cli {
    /// Project ID
    #[arg(short, long, default_value = "24229")]
    project_id: String,

    /// First included day (YYYY-MM-DD)
    #[arg(long, default_value = "2025-08-01")]
    from: NaiveDate,

    /// Last included day (YYYY-MM-DD, default: today)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tasking Manager API base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum concurrent task detail requests (overrides config)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Directory to write the CSV export into
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let to = cli.to.unwrap_or_else(|| Local::now().date_naive());
    let request = RunRequest::new(&cli.project_id, cli.from, to)?;
    let filter = TaskFilter::new(build_config(&cli)?)?;

    println!(
        "Fetching tasks for project {} from {} to {}",
        request.project_id,
        request.range.from(),
        request.range.to()
    );

    let progress = tokio::spawn(render_progress(filter.subscribe()));

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C signal");
                cancel.cancel();
            }
        })
    };

    let result = filter.run_with_cancel(request, cancel).await;
    ctrl_c.abort();
    drop(filter);
    progress.await.ok();

    let outcome = result.context("task filter run failed")?;

    let mut stdout = std::io::stdout().lock();
    render_outcome(&outcome, &mut stdout)?;

    if outcome.is_empty() {
        return Ok(());
    }

    if let Some(dir) = &cli.output_dir {
        let path = write_csv_file(dir, request.project_id, &request.range, &outcome.records)
            .with_context(|| format!("failed to write CSV into {}", dir.display()))?;
        writeln!(stdout)?;
        writeln!(stdout, "CSV written to {}", path.display())?;
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TM_TASK_FILTER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Load the config file (or defaults) and apply command line overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.api_base_url = base_url.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.max_concurrent_fetches = concurrency;
    }
    Ok(config)
}

/// Drive a progress bar on stderr until the event channel closes
async fn render_progress(mut events: broadcast::Receiver<Event>) {
    use broadcast::error::RecvError;

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{wide_bar:.cyan/blue} {pos}/{len} {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    loop {
        match events.recv().await {
            Ok(Event::TasksDiscovered { total, .. }) => {
                bar.set_length(total as u64);
                bar.set_message("fetching details");
            }
            Ok(Event::Progress { completed, .. }) => bar.set_position(completed as u64),
            Ok(Event::RunCompleted { .. }) => bar.finish_with_message("done"),
            Ok(Event::RunFailed { .. }) => bar.abandon_with_message("failed"),
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => break,
        }
    }
}

/// Write run metrics, the status summary and the result table
fn render_outcome<W: Write>(outcome: &RunOutcome, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Total Tasks Found: {}", outcome.stats.total_tasks_found)?;
    writeln!(out, "Fetch Time: {:.1}s", outcome.stats.elapsed_fetch_seconds)?;
    writeln!(out, "Filtered Tasks: {}", outcome.stats.filtered_task_count)?;

    if outcome.is_empty() {
        writeln!(out, "No tasks found matching the date criteria")?;
        return Ok(());
    }

    let summary = outcome.summary();
    writeln!(out)?;
    writeln!(out, "Status Distribution")?;
    for (status, count) in &summary.status_counts {
        writeln!(out, "  {status}: {count}")?;
    }
    if let (Some(earliest), Some(latest)) = (summary.earliest_display(), summary.latest_display()) {
        writeln!(out, "Earliest Update: {earliest}")?;
        writeln!(out, "Latest Update: {latest}")?;
    }
    writeln!(out)?;
    writeln!(out, "{}", results_table(&outcome.records))
}

fn results_table(records: &[FilteredRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(CSV_COLUMNS.map(|column| Cell::new(column).fg(Color::Cyan)));

    for record in records {
        table.add_row(vec![
            Cell::new(record.task_id),
            Cell::new(record.project_id),
            Cell::new(&record.task_status),
            Cell::new(&record.last_updated),
            Cell::new(&record.last_updated_by),
        ]);
    }

    table
}
