//! Tasking Manager API access
//!
//! [`TaskSource`] is the seam the pipeline talks to; [`TaskingManagerClient`]
//! implements it over HTTP. The two operations fail differently:
//! - listing failures are returned as [`Error::List`] and abort the run
//! - detail failures are logged and turned into `None`, so one bad task only
//!   shrinks the result set

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ProjectId, TaskDetail, TaskId, TaskSummary};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

/// Source of project task listings and task details
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// List the tasks of a project
    ///
    /// # Errors
    /// Returns [`Error::List`] on network errors, non-success statuses or
    /// malformed payloads. An empty project is `Ok(vec![])`, never an error.
    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<TaskSummary>>;

    /// Fetch the detail of one task, or `None` if it could not be retrieved
    async fn task_detail(&self, project_id: ProjectId, task_id: TaskId) -> Option<TaskDetail>;
}

/// GeoJSON feature collection returned by the project task listing
#[derive(Debug, Deserialize)]
struct TaskFeatureCollection {
    features: Vec<TaskFeature>,
}

#[derive(Debug, Deserialize)]
struct TaskFeature {
    properties: TaskSummary,
}

/// HTTP client for the Tasking Manager v2 API
#[derive(Clone, Debug)]
pub struct TaskingManagerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TaskingManagerClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {e}"),
                key: None,
            })?;

        Ok(Self { http, base_url })
    }

    /// Base URL endpoint paths are joined to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn tasks_url(&self, project_id: ProjectId) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(&format!("api/v2/projects/{project_id}/tasks/"))
    }

    fn task_url(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(&format!("api/v2/projects/{project_id}/tasks/{task_id}/"))
    }

    /// Fetch the task listing of a project
    ///
    /// Issues exactly one request to `GET /api/v2/projects/{projectId}/tasks/`.
    /// No retry is attempted.
    ///
    /// # Errors
    /// Returns [`Error::List`] naming the project and the cause.
    pub async fn list_project_tasks(&self, project_id: ProjectId) -> Result<Vec<TaskSummary>> {
        let list_err = |reason: String| Error::List {
            project_id: project_id.get(),
            reason,
        };

        let url = self
            .tasks_url(project_id)
            .map_err(|e| list_err(format!("invalid URL: {e}")))?;
        debug!(project_id = project_id.get(), url = %url, "Listing project tasks");

        let collection: TaskFeatureCollection = self.get_json(url).await.map_err(list_err)?;
        let tasks: Vec<TaskSummary> = collection
            .features
            .into_iter()
            .map(|feature| feature.properties)
            .collect();

        debug!(
            project_id = project_id.get(),
            total = tasks.len(),
            "Project listing received"
        );
        Ok(tasks)
    }

    /// Fetch one task's detail, reporting failures as errors
    ///
    /// Issues exactly one request to `GET /api/v2/projects/{projectId}/tasks/{taskId}/`.
    ///
    /// # Errors
    /// Returns [`Error::DetailFetch`] on network errors, non-success statuses or
    /// malformed payloads.
    pub async fn try_fetch_task_detail(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<TaskDetail> {
        let detail_err = |reason: String| Error::DetailFetch {
            project_id: project_id.get(),
            task_id: task_id.get(),
            reason,
        };

        let url = self
            .task_url(project_id, task_id)
            .map_err(|e| detail_err(format!("invalid URL: {e}")))?;

        self.get_json(url).await.map_err(detail_err)
    }

    /// Fetch one task's detail, turning any failure into `None`
    pub async fn fetch_task_detail(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Option<TaskDetail> {
        match self.try_fetch_task_detail(project_id, task_id).await {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(
                    project_id = project_id.get(),
                    task_id = task_id.get(),
                    error = %e,
                    "Skipping task whose detail could not be fetched"
                );
                None
            }
        }
    }

    /// GET a URL and decode its JSON body; errors are plain messages for the caller to wrap
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, String> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| format!("request to {url} failed: {e}"))?;

        // Check HTTP status before trying to parse the response body
        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status} from {url}"));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response from {url}: {e}"))?;

        serde_json::from_slice(&body).map_err(|e| format!("malformed payload from {url}: {e}"))
    }
}

#[async_trait]
impl TaskSource for TaskingManagerClient {
    async fn list_tasks(&self, project_id: ProjectId) -> Result<Vec<TaskSummary>> {
        self.list_project_tasks(project_id).await
    }

    async fn task_detail(&self, project_id: ProjectId, task_id: TaskId) -> Option<TaskDetail> {
        self.fetch_task_detail(project_id, task_id).await
    }
}
