//! In-memory progress store (non-persistent).

use super::{ProgressStore, StoreError};
use crate::progress::{Progress, ProgressRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Key = (String, String, String);

#[derive(Clone, Default)]
pub struct InMemoryProgressStore {
    rows: Arc<RwLock<HashMap<Key, Progress>>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_record(key: &Key, progress: Progress) -> ProgressRecord {
    ProgressRecord::new(key.0.clone(), key.1.clone(), key.2.clone(), progress)
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn get_task_progress(
        &self,
        user_id: &str,
        course_id: &str,
        task_id: &str,
    ) -> Result<Option<ProgressRecord>, StoreError> {
        let key = (
            user_id.to_string(),
            course_id.to_string(),
            task_id.to_string(),
        );
        let rows = self.rows.read().await;
        Ok(rows.get(&key).map(|progress| to_record(&key, *progress)))
    }

    async fn get_course_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|(key, _)| key.0 == user_id && key.1 == course_id)
            .map(|(key, progress)| to_record(key, *progress))
            .collect())
    }

    async fn get_user_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|(key, _)| key.0 == user_id)
            .map(|(key, progress)| to_record(key, *progress))
            .collect())
    }

    async fn upsert(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        if record.progress == Progress::NotStarted {
            return Err(StoreError::NotRecordable(record.task_id.clone()));
        }
        let key = (
            record.user_id.clone(),
            record.course_id.clone(),
            record.task_id.clone(),
        );
        self.rows.write().await.insert(key, record.progress);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
