use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query};
use axum::routing::{delete, patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dashboard::{CategoryStat, MAX_TREND_WINDOW_DAYS, StatusFilter, TrendPoint};
use crate::error::AppError;
use crate::models::*;
use crate::services::{SchedulerState, TickReport};
use crate::state::AppState;

#[derive(Deserialize)]
struct TaskQueryParams {
    day: Option<NaiveDate>,
    #[serde(default)]
    status: StatusFilter,
}

#[derive(Deserialize)]
struct DayParams {
    day: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct TrendParams {
    days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CompletionResponse {
    day: NaiveDate,
    completion_rate: u8,
}

#[derive(Debug, Serialize)]
struct SchedulerResponse {
    state: SchedulerState,
    interval_secs: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", delete(delete_task))
        .route("/tasks/{id}/toggle", patch(toggle_task))
        .route("/recurring", get(list_definitions).post(create_definition))
        .route("/recurring/{id}", delete(delete_definition))
        .route("/recurring/run", post(run_recurring))
        .route("/scheduler", get(scheduler_status))
        .route("/dashboard/completion", get(completion))
        .route("/dashboard/categories", get(categories))
        .route("/dashboard/priorities", get(priorities))
        .route("/dashboard/trend", get(trend))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskQueryParams>,
) -> Json<Vec<Task>> {
    let day = params.day.unwrap_or_else(|| state.service.today());
    Json(state.service.filtered_tasks(day, params.status).await)
}

async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = state.service.add_task(req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.service.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    let task = state.service.toggle_task(id).await?;
    Ok(Json(task))
}

async fn list_definitions(State(state): State<AppState>) -> Json<Vec<RecurringTaskDefinition>> {
    Json(state.service.list_definitions().await)
}

async fn create_definition(
    State(state): State<AppState>,
    Json(req): Json<NewDefinitionRequest>,
) -> Result<(StatusCode, Json<RecurringTaskDefinition>), AppError> {
    let definition = state.service.create_definition(req).await?;
    Ok((StatusCode::CREATED, Json(definition)))
}

async fn delete_definition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.service.delete_definition(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn run_recurring(State(state): State<AppState>) -> Json<TickReport> {
    Json(state.scheduler.tick().await)
}

async fn scheduler_status(State(state): State<AppState>) -> Json<SchedulerResponse> {
    Json(SchedulerResponse {
        state: state.scheduler.state(),
        interval_secs: state.scheduler.interval().as_secs(),
    })
}

async fn completion(
    State(state): State<AppState>,
    Query(params): Query<DayParams>,
) -> Json<CompletionResponse> {
    let day = params.day.unwrap_or_else(|| state.service.today());
    Json(CompletionResponse {
        day,
        completion_rate: state.service.completion_rate(day).await,
    })
}

async fn categories(State(state): State<AppState>) -> Json<BTreeMap<Category, CategoryStat>> {
    Json(state.service.category_stats().await)
}

async fn priorities(State(state): State<AppState>) -> Json<BTreeMap<Priority, usize>> {
    Json(state.service.priority_distribution().await)
}

async fn trend(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Json<Vec<TrendPoint>> {
    let days = params
        .days
        .unwrap_or(state.trend_window_days)
        .min(MAX_TREND_WINDOW_DAYS);
    Json(state.service.completion_trend(days).await)
}
