//! Progress storage with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database with a single composite-key table

mod memory;
mod sqlite;

pub use memory::InMemoryProgressStore;
pub use sqlite::SqliteProgressStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::progress::ProgressRecord;

/// Errors surfaced by progress store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("corrupt progress value '{0}' in storage")]
    CorruptValue(String),

    #[error("storage task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("refusing to store implicit progress for task {0}")]
    NotRecordable(String),
}

/// Progress store trait - implemented by all storage backends.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Point lookup. `None` means the user has not started the task.
    async fn get_task_progress(
        &self,
        user_id: &str,
        course_id: &str,
        task_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError>;

    /// All rows for one (user, course) pair.
    async fn get_course_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError>;

    /// All rows for one user across every course.
    async fn get_user_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError>;

    /// Insert the record or overwrite the progress of an existing row, atomically.
    async fn upsert(&self, record: &ProgressRecord) -> Result<(), StoreError>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

pub type SharedProgressStore = Arc<dyn ProgressStore>;

/// Progress store type selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressStoreType {
    Memory,
    #[default]
    Sqlite,
}

impl ProgressStoreType {
    /// Parse from environment variable value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" | "db" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// Create a progress store based on type and configuration.
pub async fn create_progress_store(
    store_type: ProgressStoreType,
    database_url: &str,
) -> Result<SharedProgressStore, StoreError> {
    match store_type {
        ProgressStoreType::Memory => Ok(Arc::new(InMemoryProgressStore::new())),
        ProgressStoreType::Sqlite => {
            let store = SqliteProgressStore::open(database_url).await?;
            Ok(Arc::new(store))
        }
    }
}

/// A store whose backend is always unreachable.
#[cfg(test)]
pub(crate) struct UnavailableProgressStore;

#[cfg(test)]
impl UnavailableProgressStore {
    fn error() -> StoreError {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            Some("unable to open database file".to_string()),
        ))
    }
}

#[cfg(test)]
#[async_trait]
impl ProgressStore for UnavailableProgressStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn get_task_progress(
        &self,
        _user_id: &str,
        _course_id: &str,
        _task_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        Err(Self::error())
    }

    async fn get_course_progress(
        &self,
        _user_id: &str,
        _course_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        Err(Self::error())
    }

    async fn get_user_progress(&self, _user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        Err(Self::error())
    }

    async fn upsert(&self, _record: &ProgressRecord) -> Result<(), StoreError> {
        Err(Self::error())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(Self::error())
    }
}
