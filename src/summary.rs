//! Result set summary: status distribution and update bounds

use crate::timestamp::parse_timestamp;
use crate::types::{FilteredRecord, TaskStatus};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::HashMap;

/// Display format for earliest/latest update
pub const UPDATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Aggregate view of a filtered record set
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Records per status, most frequent first (ties broken by status name)
    pub status_counts: Vec<(TaskStatus, usize)>,
    /// Earliest parseable `lastUpdated` among the records
    pub earliest_update: Option<DateTime<FixedOffset>>,
    /// Latest parseable `lastUpdated` among the records
    pub latest_update: Option<DateTime<FixedOffset>>,
}

impl RunSummary {
    /// Summarize a record set
    pub fn from_records(records: &[FilteredRecord]) -> Self {
        let mut counts: HashMap<&TaskStatus, usize> = HashMap::new();
        for record in records {
            *counts.entry(&record.task_status).or_default() += 1;
        }

        let mut status_counts: Vec<(TaskStatus, usize)> = counts
            .into_iter()
            .map(|(status, count)| (status.clone(), count))
            .collect();
        status_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

        let instants: Vec<DateTime<FixedOffset>> = records
            .iter()
            .filter_map(|r| parse_timestamp(&r.last_updated).ok().flatten())
            .collect();

        Self {
            status_counts,
            earliest_update: instants.iter().min().copied(),
            latest_update: instants.iter().max().copied(),
        }
    }

    /// Earliest update formatted for display
    pub fn earliest_display(&self) -> Option<String> {
        self.earliest_update.map(|t| t.format(UPDATE_DISPLAY_FORMAT).to_string())
    }

    /// Latest update formatted for display
    pub fn latest_display(&self) -> Option<String> {
        self.latest_update.map(|t| t.format(UPDATE_DISPLAY_FORMAT).to_string())
    }
}
