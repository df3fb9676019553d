//! Progress states and the records built from them.

use serde::{Deserialize, Serialize};

/// How far a user got with a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Progress {
    /// Implicit default, never persisted.
    #[serde(rename = "not started")]
    NotStarted,
    #[serde(rename = "started")]
    Started,
    #[serde(rename = "completed")]
    Completed,
}

impl Progress {
    pub fn as_str(&self) -> &'static str {
        match self {
            Progress::NotStarted => "not started",
            Progress::Started => "started",
            Progress::Completed => "completed",
        }
    }

    /// Parse a value a client is allowed to record.
    ///
    /// Only `started` and `completed` can be written; "not started" is the
    /// absence of a record.
    pub fn parse_recordable(value: &str) -> Option<Self> {
        match value {
            "started" => Some(Progress::Started),
            "completed" => Some(Progress::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted progress row keyed by (user, course, task).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user_id: String,
    pub course_id: String,
    pub task_id: String,
    pub progress: Progress,
}

impl ProgressRecord {
    pub fn new(
        user_id: impl Into<String>,
        course_id: impl Into<String>,
        task_id: impl Into<String>,
        progress: Progress,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: course_id.into(),
            task_id: task_id.into(),
            progress,
        }
    }
}

/// A catalog task with the user's progress on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub task_id: String,
    pub progress: Progress,
}

/// All reconciled tasks of one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: String,
    pub tasks: Vec<TaskProgress>,
}

/// Flattened cross-course entry returned by `GET /progress/{user}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItem {
    pub course_id: String,
    pub task_id: String,
    pub progress: Progress,
}
