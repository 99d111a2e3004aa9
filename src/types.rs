//! Core types for tm-task-filter

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl PartialEq<i64> for $name {
            fn eq(&self, other: &i64) -> bool {
                self.0 == *other
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

id_newtype!(
    /// Tasking Manager project identifier
    ProjectId
);

id_newtype!(
    /// Task identifier, unique within a project
    TaskId
);

/// Upstream task state
///
/// Known Tasking Manager states get their own variant; anything else is kept
/// verbatim in [`TaskStatus::Other`] so no upstream value is lost.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Available for mapping
    Ready,
    /// Locked by a mapper
    LockedForMapping,
    /// Mapped, waiting for validation
    Mapped,
    /// Locked by a validator
    LockedForValidation,
    /// Validated
    Validated,
    /// Sent back for more mapping
    Invalidated,
    /// Marked as having unusable imagery
    BadImagery,
    /// Split into smaller tasks
    Split,
    /// Any state this crate does not know about
    Other(String),
}

impl TaskStatus {
    /// Upstream wire name of this state
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Ready => "READY",
            TaskStatus::LockedForMapping => "LOCKED_FOR_MAPPING",
            TaskStatus::Mapped => "MAPPED",
            TaskStatus::LockedForValidation => "LOCKED_FOR_VALIDATION",
            TaskStatus::Validated => "VALIDATED",
            TaskStatus::Invalidated => "INVALIDATED",
            TaskStatus::BadImagery => "BADIMAGERY",
            TaskStatus::Split => "SPLIT",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "READY" => TaskStatus::Ready,
            "LOCKED_FOR_MAPPING" => TaskStatus::LockedForMapping,
            "MAPPED" => TaskStatus::Mapped,
            "LOCKED_FOR_VALIDATION" => TaskStatus::LockedForValidation,
            "VALIDATED" => TaskStatus::Validated,
            "INVALIDATED" => TaskStatus::Invalidated,
            "BADIMAGERY" => TaskStatus::BadImagery,
            "SPLIT" => TaskStatus::Split,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of a project task listing; only the id is used
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    /// Task id
    pub task_id: TaskId,
}

/// One status-changing action in a task's history
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHistoryEntry {
    /// Username of whoever performed the action
    #[serde(default)]
    pub action_by: String,

    /// Action kind (e.g., "STATE_CHANGE", "LOCKED_FOR_MAPPING")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// When the action happened, as reported upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_date: Option<String>,
}

/// Task detail as returned by the task detail endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    /// Task id
    pub task_id: TaskId,
    /// Project the task belongs to
    pub project_id: ProjectId,
    /// Current task state
    pub task_status: TaskStatus,
    /// Last update timestamp string (see [`crate::timestamp`])
    #[serde(default)]
    pub last_updated: Option<String>,
    /// History entries, most recent first
    #[serde(default)]
    pub task_history: Option<Vec<TaskHistoryEntry>>,
}

impl TaskDetail {
    /// Who performed the most recent action, or `""` without history
    pub fn last_updated_by(&self) -> &str {
        self.task_history
            .as_deref()
            .and_then(|history| history.first())
            .map(|entry| entry.action_by.as_str())
            .unwrap_or("")
    }
}

/// A task that passed the date filter; the unit of pipeline output
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredRecord {
    /// Task id
    pub task_id: TaskId,
    /// Project id as reported by the detail endpoint
    pub project_id: ProjectId,
    /// Task state
    pub task_status: TaskStatus,
    /// Upstream timestamp string, unmodified
    pub last_updated: String,
    /// Author of the most recent history entry (`""` without history)
    pub last_updated_by: String,
}

impl FilteredRecord {
    /// Build the output record for a detail whose timestamp is already known
    pub fn from_detail(detail: TaskDetail) -> Self {
        let last_updated_by = detail.last_updated_by().to_string();
        Self {
            task_id: detail.task_id,
            project_id: detail.project_id,
            task_status: detail.task_status,
            last_updated: detail.last_updated.unwrap_or_default(),
            last_updated_by,
        }
    }
}

/// Inclusive calendar date range
///
/// Construct with [`DateRange::new`], which guarantees `from <= to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = Error;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.from, raw.to)
    }
}

impl DateRange {
    /// Create a range, rejecting `from > to`
    ///
    /// # Errors
    /// Returns [`Error::Input`] when `from` is later than `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::input(
                "date range",
                format!("from date {from} cannot be later than to date {to}"),
            ));
        }
        Ok(Self { from, to })
    }

    /// First included day
    pub fn from(&self) -> NaiveDate {
        self.from
    }

    /// Last included day
    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whether `date` lies within the range, bounds included
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.from, self.to)
    }
}

/// Validated inputs for one run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunRequest {
    /// Project to scan
    pub project_id: ProjectId,
    /// Accepted `lastUpdated` dates
    pub range: DateRange,
}

impl RunRequest {
    /// Validate raw inputs
    ///
    /// The project id is trimmed and must be a positive integer; the date range
    /// must not be inverted. Nothing touches the network here.
    ///
    /// # Errors
    /// Returns [`Error::Input`] for a malformed or non-positive project id or an
    /// inverted range.
    pub fn new(project_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Self> {
        let project_id: ProjectId = project_id
            .trim()
            .parse()
            .map_err(|_| Error::input("project id", "Project ID must be a number"))?;

        if project_id.get() <= 0 {
            return Err(Error::input(
                "project id",
                format!("Project ID must be positive, got {project_id}"),
            ));
        }

        Ok(Self {
            project_id,
            range: DateRange::new(from, to)?,
        })
    }
}

/// Aggregate numbers for a finished run
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Number of tasks in the project listing
    pub total_tasks_found: usize,
    /// Wall-clock seconds spent fetching and filtering details
    pub elapsed_fetch_seconds: f64,
    /// Number of records that passed the filter
    pub filtered_task_count: usize,
}

/// Event emitted during a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Inputs validated, listing about to start
    RunStarted {
        /// Project being scanned
        project_id: ProjectId,
        /// Requested date range
        range: DateRange,
    },

    /// Project listing succeeded
    TasksDiscovered {
        /// Project being scanned
        project_id: ProjectId,
        /// Number of tasks found
        total: usize,
    },

    /// One more task finished (fetched and filtered, or failed)
    Progress {
        /// Tasks finished so far
        completed: usize,
        /// Tasks in the run
        total: usize,
        /// `completed / total`, in `[0, 1]`
        fraction: f64,
    },

    /// All tasks processed
    RunCompleted {
        /// Project that was scanned
        project_id: ProjectId,
        /// Final statistics
        stats: RunStatistics,
    },

    /// The run completed but no task matched the date range
    NoMatchingTasks {
        /// Project that was scanned
        project_id: ProjectId,
    },

    /// The run aborted
    RunFailed {
        /// Project that was scanned
        project_id: ProjectId,
        /// Error message
        error: String,
    },
}

/// Records and statistics of a completed run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Matching tasks, in discovery order
    pub records: Vec<FilteredRecord>,
    /// Run statistics
    pub stats: RunStatistics,
}

impl RunOutcome {
    /// Whether no task matched
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Status distribution and update bounds of the records
    pub fn summary(&self) -> crate::summary::RunSummary {
        crate::summary::RunSummary::from_records(&self.records)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_task_status_known_and_unknown() {
        let cases = [
            ("READY", TaskStatus::Ready),
            ("LOCKED_FOR_MAPPING", TaskStatus::LockedForMapping),
            ("MAPPED", TaskStatus::Mapped),
            ("LOCKED_FOR_VALIDATION", TaskStatus::LockedForValidation),
            ("VALIDATED", TaskStatus::Validated),
            ("INVALIDATED", TaskStatus::Invalidated),
            ("BADIMAGERY", TaskStatus::BadImagery),
            ("SPLIT", TaskStatus::Split),
        ];
        for (wire, status) in cases {
            let parsed: TaskStatus = serde_json::from_str(&format!("\"{wire}\"")).unwrap();
            assert_eq!(parsed, status);
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{wire}\""));
        }

        let other: TaskStatus = serde_json::from_str("\"ARCHIVED\"").unwrap();
        assert_eq!(other, TaskStatus::Other("ARCHIVED".to_string()));
        assert_eq!(other.to_string(), "ARCHIVED");
    }

    #[test]
    fn test_task_detail_deserializes_upstream_payload() {
        let json = r#"{
            "taskId": 1,
            "projectId": 24229,
            "taskStatus": "MAPPED",
            "lastUpdated": "2025-08-01T10:00:00.000000+00:00",
            "numberOfComments": 0,
            "taskHistory": [
                {"historyId": 9, "action": "STATE_CHANGE", "actionDate": "2025-08-01T10:00:00.000000Z", "actionBy": "alice"},
                {"historyId": 8, "action": "LOCKED_FOR_MAPPING", "actionBy": "bob"}
            ]
        }"#;
        let detail: TaskDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.task_id, 1);
        assert_eq!(detail.project_id, 24229);
        assert_eq!(detail.task_status, TaskStatus::Mapped);
        assert_eq!(detail.last_updated_by(), "alice");

        let record = FilteredRecord::from_detail(detail);
        assert_eq!(record.last_updated, "2025-08-01T10:00:00.000000+00:00");
        assert_eq!(record.last_updated_by, "alice");
    }

    #[test]
    fn test_missing_or_empty_history_gives_empty_author() {
        let missing: TaskDetail = serde_json::from_str(
            r#"{"taskId": 2, "projectId": 5, "taskStatus": "READY", "lastUpdated": null}"#,
        )
        .unwrap();
        assert_eq!(missing.last_updated_by(), "");
        assert!(missing.last_updated.is_none());

        let empty: TaskDetail = serde_json::from_str(
            r#"{"taskId": 2, "projectId": 5, "taskStatus": "READY", "taskHistory": []}"#,
        )
        .unwrap();
        assert_eq!(empty.last_updated_by(), "");
    }

    #[test]
    fn test_filtered_record_uses_upstream_field_names() {
        let record = FilteredRecord {
            task_id: TaskId(1),
            project_id: ProjectId(24229),
            task_status: TaskStatus::Validated,
            last_updated: "2025-08-01T10:00:00.000000+00:00".to_string(),
            last_updated_by: "alice".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["taskId"], 1);
        assert_eq!(value["projectId"], 24229);
        assert_eq!(value["taskStatus"], "VALIDATED");
        assert_eq!(value["lastUpdatedBy"], "alice");
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange::new(date(2025, 8, 1), date(2025, 8, 3)).unwrap();
        assert!(range.contains(date(2025, 8, 1)));
        assert!(range.contains(date(2025, 8, 3)));
        assert!(!range.contains(date(2025, 7, 31)));
        assert!(!range.contains(date(2025, 8, 4)));

        let single = DateRange::new(date(2025, 8, 1), date(2025, 8, 1)).unwrap();
        assert!(single.contains(date(2025, 8, 1)));
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        let err = DateRange::new(date(2025, 8, 2), date(2025, 8, 1)).unwrap_err();
        assert!(matches!(err, Error::Input { field: "date range", .. }));
    }

    #[test]
    fn test_date_range_deserialize_validates() {
        let ok: DateRange =
            serde_json::from_str(r#"{"from":"2025-08-01","to":"2025-08-02"}"#).unwrap();
        assert_eq!(ok.from(), date(2025, 8, 1));

        let reversed: serde_json::Result<DateRange> =
            serde_json::from_str(r#"{"from":"2025-08-02","to":"2025-08-01"}"#);
        assert!(reversed.is_err());
    }

    #[test]
    fn test_run_request_validation() {
        let from = date(2025, 8, 1);
        let to = date(2025, 8, 31);

        let ok = RunRequest::new(" 24229 ", from, to).unwrap();
        assert_eq!(ok.project_id, ProjectId(24229));

        for bad in ["abc", "", "12.5", "0", "-3"] {
            assert!(
                matches!(
                    RunRequest::new(bad, from, to),
                    Err(Error::Input { field: "project id", .. })
                ),
                "{bad:?} should be rejected"
            );
        }

        assert!(matches!(
            RunRequest::new("24229", to, from),
            Err(Error::Input { field: "date range", .. })
        ));
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = Event::TasksDiscovered {
            project_id: ProjectId(7),
            total: 3,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tasks_discovered");
        assert_eq!(value["total"], 3);
    }
}
