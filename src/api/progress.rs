//! Progress API endpoints.
//!
//! - `GET /progress/:user` - Reconciled progress across every course
//! - `GET /progress/:user/:course` - Reconciled progress for one course
//! - `GET /progress/:user/:course/:task` - Progress on a single task
//! - `PUT /progress/:user/:course/:task` - Record progress on a task

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::error::ApiError;
use super::routes::AppState;
use crate::catalog::CatalogError;
use crate::progress::{Progress, ProgressRecord, TaskProgress};
use crate::reconcile::{flatten, reconcile_course, reconcile_user, CourseTasks};

/// Encode `value` as a JSON response body.
fn json_response<T: Serialize>(value: &T) -> Result<Response, ApiError> {
    let body = serde_json::to_vec(value)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Resolve `course_id` and fetch its task list. An empty list is a not-found.
async fn course_tasks(state: &AppState, course_id: &str) -> Result<Vec<String>, ApiError> {
    let location = state.catalog.resolve_course_location(course_id).await?;
    let tasks = state.catalog.fetch_tasks(&location).await?;
    if tasks.is_empty() {
        return Err(ApiError::NotFound(format!(
            "User or course not found. Course service at {} returned no tasks",
            location
        )));
    }
    Ok(tasks)
}

/// GET /progress/:user/:course
pub async fn get_course_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let tasks = course_tasks(&state, &course_id).await?;
    let records = state.store.get_course_progress(&user_id, &course_id).await?;
    let course = reconcile_course(&course_id, &tasks, &records);
    tracing::debug!(
        "Reconciled {} tasks for user {} in course {} ({} stored rows)",
        course.tasks.len(),
        user_id,
        course_id,
        records.len()
    );
    json_response(&course.tasks)
}

/// GET /progress/:user/:course/:task
pub async fn get_task_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, course_id, task_id)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    let tasks = course_tasks(&state, &course_id).await?;
    if !tasks.iter().any(|t| *t == task_id) {
        return Err(ApiError::NotFound(format!(
            "Task {} not found in course {}",
            task_id, course_id
        )));
    }

    let record = state
        .store
        .get_task_progress(&user_id, &course_id, &task_id)
        .await?;
    let progress = record
        .map(|r| r.progress)
        .unwrap_or(Progress::NotStarted);
    json_response(&TaskProgress { task_id, progress })
}

/// PUT /progress/:user/:course/:task
pub async fn put_task_progress(
    State(state): State<Arc<AppState>>,
    Path((user_id, course_id, task_id)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let req: Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::BadRequest(format!("Failed to parse request body: {}", e))
    })?;

    // Missing, null or non-string values are rejected like unknown literals.
    let requested = req.get("progress").unwrap_or(&Value::Null);
    let progress = requested
        .as_str()
        .and_then(Progress::parse_recordable)
        .ok_or_else(|| {
            ApiError::InvalidProgress(format!(
                "Invalid progress type {}. Valid types: 'started', 'completed'",
                requested
            ))
        })?;

    let record = ProgressRecord {
        user_id,
        course_id,
        task_id,
        progress,
    };
    state.store.upsert(&record).await?;
    tracing::info!(
        "Recorded progress {} for user {} on {}/{}",
        record.progress,
        record.user_id,
        record.course_id,
        record.task_id
    );
    Ok(StatusCode::OK)
}

/// GET /progress/:user
pub async fn get_user_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError> {
    let courses = state.catalog.list_all_course_locations().await?;
    if courses.is_empty() {
        return Err(ApiError::NotFound(
            "No courses found. Course manager returned no courses".to_string(),
        ));
    }

    let catalog = &state.catalog;
    let task_lists = try_join_all(courses.iter().map(|course| async move {
        let tasks = catalog.fetch_tasks(&course.url).await?;
        Ok::<_, CatalogError>(CourseTasks {
            course_id: course.course_id.clone(),
            tasks,
        })
    }))
    .await?;

    let records = state.store.get_user_progress(&user_id).await?;
    let per_course = reconcile_user(&task_lists, &records);
    if per_course.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No course offers any tasks. No progress found for user {}",
            user_id
        )));
    }

    json_response(&flatten(per_course))
}
