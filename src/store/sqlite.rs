//! SQLite-based progress store.

use super::{ProgressStore, StoreError};
use crate::progress::{Progress, ProgressRecord};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS course_progress (
    user_id TEXT NOT NULL,
    course_id TEXT NOT NULL,
    task_id TEXT NOT NULL,
    progress TEXT NOT NULL CHECK (progress IN ('started', 'completed')),
    PRIMARY KEY (user_id, course_id, task_id)
);
"#;

pub struct SqliteProgressStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteProgressStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let path = path.to_string();
        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)?;
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, StoreError>(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await?
    }
}

fn parse_progress(s: &str) -> Result<Progress, StoreError> {
    Progress::parse_recordable(s).ok_or_else(|| StoreError::CorruptValue(s.to_string()))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn collect_records(
    rows: impl Iterator<Item = rusqlite::Result<(String, String, String, String)>>,
) -> Result<Vec<ProgressRecord>, StoreError> {
    let mut records = Vec::new();
    for row in rows {
        let (user_id, course_id, task_id, progress) = row?;
        records.push(ProgressRecord {
            user_id,
            course_id,
            task_id,
            progress: parse_progress(&progress)?,
        });
    }
    Ok(records)
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    fn is_persistent(&self) -> bool {
        true
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
        self.with_conn(move |conn| {
            let (user_id, course_id, task_id) = key;
            let progress: Option<String> = conn
                .query_row(
                    "SELECT progress FROM course_progress
                     WHERE user_id = ?1 AND course_id = ?2 AND task_id = ?3",
                    params![user_id, course_id, task_id],
                    |row| row.get(0),
                )
                .optional()?;

            progress
                .map(|p| -> Result<ProgressRecord, StoreError> {
                    Ok(ProgressRecord {
                        progress: parse_progress(&p)?,
                        user_id,
                        course_id,
                        task_id,
                    })
                })
                .transpose()
        })
        .await
    }

    async fn get_course_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Vec<ProgressRecord>, StoreError> {
        let user_id = user_id.to_string();
        let course_id = course_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, course_id, task_id, progress FROM course_progress
                 WHERE user_id = ?1 AND course_id = ?2",
            )?;
            let rows = stmt.query_map(params![user_id, course_id], row_to_record)?;
            collect_records(rows)
        })
        .await
    }

    async fn get_user_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, course_id, task_id, progress FROM course_progress
                 WHERE user_id = ?1",
            )?;
            let rows = stmt.query_map(params![user_id], row_to_record)?;
            collect_records(rows)
        })
        .await
    }

    async fn upsert(&self, record: &ProgressRecord) -> Result<(), StoreError> {
        if record.progress == Progress::NotStarted {
            return Err(StoreError::NotRecordable(record.task_id.clone()));
        }
        let record = record.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO course_progress (user_id, course_id, task_id, progress)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, course_id, task_id)
                 DO UPDATE SET progress = excluded.progress",
                params![
                    record.user_id,
                    record.course_id,
                    record.task_id,
                    record.progress.as_str()
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}
