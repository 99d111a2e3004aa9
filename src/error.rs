//! Error types for tm-task-filter
//!
//! Errors fall into two groups:
//! - Run-stopping errors ([`Error::Input`], [`Error::List`], [`Error::Cancelled`])
//!   that abort a run and are surfaced to the caller
//! - Per-task errors ([`Error::DetailFetch`], [`Error::Parse`]) that the pipeline
//!   absorbs locally, shrinking the result set instead of failing the batch

use thiserror::Error;

/// Result type alias for tm-task-filter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tm-task-filter
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run input (project id, date range); raised before any network call
    #[error("invalid {field}: {message}")]
    Input {
        /// The input field that was rejected (e.g., "project id")
        field: &'static str,
        /// Human-readable explanation
        message: String,
    },

    /// The project task listing could not be retrieved; fatal to the run
    #[error("failed to list tasks for project {project_id}: {reason}")]
    List {
        /// Upstream project id
        project_id: i64,
        /// Human-readable cause (network, HTTP status or payload shape)
        reason: String,
    },

    /// A single task detail could not be retrieved
    #[error("failed to fetch task {task_id} of project {project_id}: {reason}")]
    DetailFetch {
        /// Upstream project id
        project_id: i64,
        /// Upstream task id
        task_id: i64,
        /// Human-readable cause
        reason: String,
    },

    /// An upstream timestamp could not be parsed
    #[error("unparseable timestamp {input:?}: {reason}")]
    Parse {
        /// The rejected timestamp string
        input: String,
        /// Parser message
        reason: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_base_url")
        key: Option<String>,
    },

    /// The run was cancelled before all tasks were processed
    #[error("run cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an [`Error::Input`]
    pub fn input(field: &'static str, message: impl Into<String>) -> Self {
        Error::Input {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Config`] tied to a config key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether this error stops a run (as opposed to being absorbed per task)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::DetailFetch { .. } | Error::Parse { .. })
    }
}
