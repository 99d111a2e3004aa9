//! Bounded concurrent fetch-and-filter pipeline
//!
//! One run lists a project's tasks once, then fetches every task detail
//! concurrently, never letting more than `max_concurrent_fetches` requests be
//! outstanding, and keeps the tasks whose `lastUpdated` date lies in the range.
//!
//! Results are collected positionally, so records come out in discovery order
//! regardless of completion order. Progress is reported per finished task
//! (completion count), which makes the progress sequence strictly increasing.

use crate::client::{TaskSource, TaskingManagerClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::timestamp::timestamp_date;
use crate::types::{
    DateRange, Event, FilteredRecord, ProjectId, RunOutcome, RunRequest, RunStatistics,
    TaskDetail, TaskId,
};
use chrono::NaiveDate;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};


/// Capacity of the event broadcast channel
const EVENT_BUFFER: usize = 1000;

/// Runs the fetch-and-filter pipeline against a [`TaskSource`]
///
/// Cloning is cheap and clones share the event channel.
#[derive(Clone)]
pub struct TaskFilter {
    source: Arc<dyn TaskSource>,
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
}

impl TaskFilter {
    /// Create a filter backed by the Tasking Manager HTTP API
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = TaskingManagerClient::new(&config)?;
        Self::with_source(config, Arc::new(client))
    }

    /// Create a filter backed by any task source
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn with_source(config: Config, source: Arc<dyn TaskSource>) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_BUFFER);
        Ok(Self {
            source,
            config: Arc::new(config),
            event_tx,
        })
    }

    /// Subscribe to run events
    ///
    /// Only events sent after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate raw inputs, then run
    ///
    /// # Errors
    /// Returns [`Error::Input`] before any network call when the project id is
    /// not a positive integer or `from > to`, and [`Error::List`] when the
    /// listing fails.
    pub async fn filter_tasks(
        &self,
        project_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<RunOutcome> {
        let request = RunRequest::new(project_id, from, to)?;
        self.run(request).await
    }

    /// Run the pipeline to completion
    ///
    /// # Errors
    /// Returns [`Error::List`] when the project listing fails. Detail failures
    /// only shrink the result set.
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run the pipeline, abandoning it when `cancel` fires
    ///
    /// On cancellation every in-flight fetch is dropped and
    /// [`Error::Cancelled`] is returned; no partial records are produced.
    ///
    /// # Errors
    /// Returns [`Error::List`] when the project listing fails and
    /// [`Error::Cancelled`] when `cancel` fires first.
    pub async fn run_with_cancel(
        &self,
        request: RunRequest,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        let RunRequest { project_id, range } = request;
        info!(
            project_id = project_id.get(),
            from = %range.from(),
            to = %range.to(),
            "Starting task filter run"
        );
        self.emit(Event::RunStarted { project_id, range });

        let listing = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            listing = self.source.list_tasks(project_id) => listing,
        };
        let tasks = match listing {
            Ok(tasks) => tasks,
            Err(e) => return Err(self.fail(project_id, e)),
        };

        let total = tasks.len();
        info!(project_id = project_id.get(), total, "Project tasks discovered");
        self.emit(Event::TasksDiscovered { project_id, total });

        let started = Instant::now();
        let limiter = Semaphore::new(self.config.max_concurrent_fetches);
        let completed = AtomicUsize::new(0);

        let fetches = tasks.iter().map(|task| {
            self.fetch_and_filter(project_id, task.task_id, &range, &limiter, &completed, total)
        });

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.fail(project_id, Error::Cancelled)),
            results = join_all(fetches) => results,
        };

        let records: Vec<FilteredRecord> = results.into_iter().flatten().collect();
        let stats = RunStatistics {
            total_tasks_found: total,
            elapsed_fetch_seconds: started.elapsed().as_secs_f64(),
            filtered_task_count: records.len(),
        };

        info!(
            project_id = project_id.get(),
            total,
            matched = stats.filtered_task_count,
            elapsed_secs = stats.elapsed_fetch_seconds,
            "Task filter run complete"
        );
        self.emit(Event::RunCompleted { project_id, stats });
        if records.is_empty() {
            self.emit(Event::NoMatchingTasks { project_id });
        }

        Ok(RunOutcome { records, stats })
    }

    /// Fetch one task under the limiter and keep it if it matches
    async fn fetch_and_filter(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        range: &DateRange,
        limiter: &Semaphore,
        completed: &AtomicUsize,
        total: usize,
    ) -> Option<FilteredRecord> {
        // The permit is held only while the request is outstanding
        let detail = match limiter.acquire().await {
            Ok(_permit) => self.source.task_detail(project_id, task_id).await,
            Err(e) => {
                warn!(task_id = task_id.get(), error = %e, "Fetch limiter closed");
                None
            }
        };

        let record = detail.and_then(|detail| filter_detail(detail, range));

        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit(Event::Progress {
            completed: done,
            total,
            fraction: done as f64 / total as f64,
        });

        record
    }

    fn fail(&self, project_id: ProjectId, error: Error) -> Error {
        warn!(project_id = project_id.get(), error = %error, "Task filter run failed");
        self.emit(Event::RunFailed {
            project_id,
            error: error.to_string(),
        });
        error
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}

/// Keep a task detail if its `lastUpdated` date falls in `range`
///
/// Missing or unparseable timestamps never match.
pub fn filter_detail(detail: TaskDetail, range: &DateRange) -> Option<FilteredRecord> {
    let date = detail.last_updated.as_deref().and_then(timestamp_date);

    match date {
        Some(date) if range.contains(date) => Some(FilteredRecord::from_detail(detail)),
        Some(_) => None,
        None => {
            debug!(
                task_id = detail.task_id.get(),
                last_updated = ?detail.last_updated,
                "Excluding task without a usable lastUpdated"
            );
            None
        }
    }
}
