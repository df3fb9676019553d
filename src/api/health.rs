//! Health check endpoint.
//!
//! Verifies the progress store, the course manager and every course service it
//! lists, in that order. The first failure turns the response into a 500.

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use super::error::ApiError;
use super::routes::AppState;

/// GET|HEAD /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.store.ping().await?;

    let catalog = &state.catalog;
    catalog.check_health(catalog.base_url()).await?;

    let courses = catalog.list_all_course_locations().await?;
    for course in &courses {
        catalog.check_health(&course.url).await?;
    }

    tracing::debug!("Health check passed ({} course services)", courses.len());
    Ok(StatusCode::OK)
}
