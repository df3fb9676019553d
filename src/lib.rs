//! # Course Progress
//!
//! Tracks how far each user got with each task of each course, and answers
//! queries that merge stored progress with the tasks a course offers right now.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP request
//!        │
//!        ▼
//!   ┌──────────┐  resolve course / fetch tasks   ┌──────────────────┐
//!   │   api    │ ──────────────────────────────▶ │ catalog (remote) │
//!   │ handlers │                                 └──────────────────┘
//!   │          │  stored rows                    ┌──────────────────┐
//!   │          │ ──────────────────────────────▶ │      store       │
//!   └────┬─────┘                                 └──────────────────┘
//!        │ tasks + rows
//!        ▼
//!   ┌───────────┐
//!   │ reconcile │  left outer join, default "not started"
//!   └───────────┘
//! ```
//!
//! ## Modules
//! - `api`: axum routes and error mapping
//! - `catalog`: course manager / course service client
//! - `config`: environment-driven configuration
//! - `progress`: progress states and wire types
//! - `reconcile`: merging catalog tasks with stored progress
//! - `store`: progress persistence (SQLite or in-memory)

pub mod api;
pub mod catalog;
pub mod config;
pub mod progress;
pub mod reconcile;
pub mod store;

pub use catalog::CatalogClient;
pub use config::Config;
pub use progress::{Progress, ProgressRecord};
pub use store::{ProgressStore, ProgressStoreType};
