//! Mock Tasking Manager API built on wiremock

use serde_json::{Value, json};
use tm_task_filter::{Config, TaskFilter};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Project id used throughout the fixtures
pub const PROJECT_ID: i64 = 24229;

/// Listing body for the given task ids
pub fn listing(task_ids: &[i64]) -> Value {
    let features: Vec<Value> = task_ids
        .iter()
        .map(|id| {
            json!({
                "type": "Feature",
                "geometry": {"type": "MultiPolygon", "coordinates": []},
                "properties": {"taskId": id, "taskX": 1, "taskY": 2, "taskStatus": "READY"}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

/// Detail body for one task
pub fn task_detail(task_id: i64, status: &str, last_updated: &str, actors: &[&str]) -> Value {
    let history: Vec<Value> = actors
        .iter()
        .enumerate()
        .map(|(i, actor)| json!({"historyId": i, "action": "STATE_CHANGE", "actionBy": actor}))
        .collect();
    json!({
        "taskId": task_id,
        "projectId": PROJECT_ID,
        "taskStatus": status,
        "lockHolder": null,
        "lastUpdated": last_updated,
        "taskHistory": history
    })
}

/// Mount the project listing
pub async fn mount_listing(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/projects/{PROJECT_ID}/tasks/")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mount one task detail
pub async fn mount_detail(server: &MockServer, task_id: i64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/projects/{PROJECT_ID}/tasks/{task_id}/")))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Filter pointed at the mock server
pub fn filter_for(server: &MockServer) -> TaskFilter {
    let config = Config {
        api_base_url: server.uri(),
        ..Default::default()
    };
    TaskFilter::new(config).expect("valid config")
}

/// Number of detail requests the server received
pub async fn detail_request_count(server: &MockServer) -> usize {
    let listing_path = format!("/api/v2/projects/{PROJECT_ID}/tasks/");
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() != listing_path)
        .count()
}
