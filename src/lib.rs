//! # tm-task-filter
//!
//! Fetch the tasks of a Tasking Manager project and keep those last updated
//! within a date range.
//!
//! A run lists the project's tasks once, fetches every task detail
//! concurrently (at most 10 requests in flight by default), and keeps the
//! tasks whose `lastUpdated` date falls inside the inclusive range. A failed
//! listing aborts the run; a failed task detail only drops that task.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use tm_task_filter::{Config, Event, TaskFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let filter = TaskFilter::new(Config::default())?;
//!
//!     let mut events = filter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Progress { fraction, .. } = event {
//!                 eprintln!("{:.0}%", fraction * 100.0);
//!             }
//!         }
//!     });
//!
//!     let from = NaiveDate::from_ymd_opt(2025, 8, 1).ok_or("bad date")?;
//!     let to = NaiveDate::from_ymd_opt(2025, 8, 31).ok_or("bad date")?;
//!     let outcome = filter.filter_tasks("24229", from, to).await?;
//!
//!     let stats = &outcome.stats;
//!     println!("{} of {} tasks matched", stats.filtered_task_count, stats.total_tasks_found);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Tasking Manager API client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// CSV export
pub mod export;
/// Fetch-and-filter pipeline
pub mod pipeline;
/// Result set summary
pub mod summary;
/// Upstream timestamp parsing
pub mod timestamp;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use client::{TaskSource, TaskingManagerClient};
pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::TaskFilter;
pub use summary::RunSummary;
pub use types::{
    DateRange, Event, FilteredRecord, ProjectId, RunOutcome, RunRequest, RunStatistics,
    TaskDetail, TaskHistoryEntry, TaskId, TaskStatus, TaskSummary,
};
