mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{Harness, at, harness};
use worklog::api::router;
use worklog::services::RecurrenceScheduler;
use worklog::state::AppState;

async fn app() -> (Router, Harness) {
    let h = harness(at(2025, 6, 2, 9, 0)).await;
    let scheduler = Arc::new(RecurrenceScheduler::new(
        h.service.clone(),
        Duration::from_secs(60),
    ));
    let state = AppState {
        service: h.service.clone(),
        scheduler,
        trend_window_days: 7,
    };
    (router(state), h)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _h) = app().await;
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn task_lifecycle_over_http() {
    let (app, _h) = app().await;

    let (status, created) = send(
        &app,
        "POST",
        "/tasks",
        Some(json!({
            "text": "Prepare slides",
            "category": "meeting",
            "priority": "high",
            "due_date": "2025-06-02T15:00:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["category"], "meeting");
    let id = created["id"].as_str().unwrap().to_string();

    let (_, listed) = send(&app, "GET", "/tasks?day=2025-06-02&status=active", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, toggled) = send(&app, "PATCH", &format!("/tasks/{}/toggle", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["completed"], true);

    let (_, active) = send(&app, "GET", "/tasks?status=active", None).await;
    assert!(active.as_array().unwrap().is_empty());

    let (_, completion) = send(&app, "GET", "/dashboard/completion", None).await;
    assert_eq!(completion["day"], "2025-06-02");
    assert_eq!(completion["completion_rate"], 100);

    let (_, categories) = send(&app, "GET", "/dashboard/categories", None).await;
    assert_eq!(categories["meeting"]["total"], 1);
    assert!(categories.get("work").is_none());

    let (status, _) = send(&app, "DELETE", &format!("/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "DELETE", &format!("/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
}

#[tokio::test]
async fn empty_task_text_is_bad_request() {
    let (app, _h) = app().await;
    let (status, body) = send(&app, "POST", "/tasks", Some(json!({ "text": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn recurring_definitions_over_http() {
    let (app, h) = app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/recurring",
        Some(json!({
            "text": "Standup",
            "start_due_date": "2025-06-02T09:00:00",
            "pattern": "fortnightly"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/recurring",
        Some(json!({
            "text": "Standup",
            "start_due_date": "2025-06-02T09:00:00"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "400 Bad Request");
    assert!(body["message"].as_str().unwrap().contains("pattern"));

    let (status, def) = send(
        &app,
        "POST",
        "/recurring",
        Some(json!({
            "text": "Standup",
            "start_due_date": "2025-06-02T09:00:00",
            "pattern": "weekly"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(def["pattern"], "weekly");

    let (_, report) = send(&app, "POST", "/recurring/run", None).await;
    assert_eq!(report["generated"].as_array().unwrap().len(), 0);

    h.clock.set(at(2025, 6, 9, 8, 0));
    let (_, report) = send(&app, "POST", "/recurring/run", None).await;
    assert_eq!(report["generated"].as_array().unwrap().len(), 1);
    assert_eq!(report["evaluated"], 1);

    let (_, today) = send(&app, "GET", "/tasks", None).await;
    assert_eq!(today[0]["text"], "Standup");
    assert_eq!(today[0]["recurring_source_id"], def["id"]);

    let (_, trend) = send(&app, "GET", "/dashboard/trend?days=3", None).await;
    let trend = trend.as_array().unwrap();
    assert_eq!(trend.len(), 3);
    assert_eq!(trend[2]["day"], "2025-06-09");

    let (_, scheduler) = send(&app, "GET", "/scheduler", None).await;
    assert_eq!(scheduler["state"], "stopped");
}
