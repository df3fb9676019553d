//! HTTP API for the course progress service.
//!
//! ## Endpoints
//!
//! - `GET /progress/{user}` - Progress across every course in the catalog
//! - `GET /progress/{user}/{course}` - Progress on every task of a course
//! - `GET /progress/{user}/{course}/{task}` - Progress on a single task
//! - `PUT /progress/{user}/{course}/{task}` - Record `started` or `completed`
//! - `GET|HEAD /health` - Store and catalog health check

pub mod error;
mod health;
pub mod progress;
mod routes;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
