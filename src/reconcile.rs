//! Progress reconciliation.
//!
//! The catalog decides which tasks exist; stored rows decide how far the user
//! got. Reconciliation is a left outer join of the catalog's task list against
//! stored progress keyed on task id:
//!
//! - output order and length follow the catalog list (duplicates collapsed to
//!   their first occurrence)
//! - tasks without a stored row default to [`Progress::NotStarted`]
//! - stored rows for tasks the catalog no longer offers are dropped

use std::collections::{HashMap, HashSet};

use crate::progress::{CourseProgress, Progress, ProgressItem, ProgressRecord, TaskProgress};

/// The task list the catalog reported for one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseTasks {
    pub course_id: String,
    pub tasks: Vec<String>,
}

/// Merge catalog `tasks` with `(task_id, progress)` pairs.
pub fn reconcile<'a, I>(tasks: &[String], progress: I) -> Vec<TaskProgress>
where
    I: IntoIterator<Item = (&'a str, Progress)>,
{
    let mut known: HashMap<&str, Progress> = HashMap::new();
    for (task_id, state) in progress {
        known.entry(task_id).or_insert(state);
    }

    let mut seen = HashSet::with_capacity(tasks.len());
    tasks
        .iter()
        .filter(|task_id| seen.insert(task_id.as_str()))
        .map(|task_id| TaskProgress {
            task_id: task_id.clone(),
            progress: known
                .get(task_id.as_str())
                .copied()
                .unwrap_or(Progress::NotStarted),
        })
        .collect()
}

/// Reconcile one course. Records belonging to other courses are ignored.
pub fn reconcile_course(
    course_id: &str,
    tasks: &[String],
    records: &[ProgressRecord],
) -> CourseProgress {
    let progress = records
        .iter()
        .filter(|r| r.course_id == course_id)
        .map(|r| (r.task_id.as_str(), r.progress));
    CourseProgress {
        course_id: course_id.to_string(),
        tasks: reconcile(tasks, progress),
    }
}

/// Reconcile every course of a user, keeping catalog course order.
///
/// Courses that report no tasks contribute nothing. An empty result means no
/// course had any task, which callers treat as not found.
pub fn reconcile_user(courses: &[CourseTasks], records: &[ProgressRecord]) -> Vec<CourseProgress> {
    let mut by_course: HashMap<&str, Vec<(&str, Progress)>> = HashMap::new();
    for record in records {
        by_course
            .entry(record.course_id.as_str())
            .or_default()
            .push((record.task_id.as_str(), record.progress));
    }

    courses
        .iter()
        .filter(|course| !course.tasks.is_empty())
        .map(|course| {
            let stored = by_course
                .get(course.course_id.as_str())
                .map(|v| v.as_slice())
                .unwrap_or(&[]);
            CourseProgress {
                course_id: course.course_id.clone(),
                tasks: reconcile(&course.tasks, stored.iter().copied()),
            }
        })
        .collect()
}

/// Flatten per-course results into the cross-course item list.
pub fn flatten(courses: Vec<CourseProgress>) -> Vec<ProgressItem> {
    courses
        .into_iter()
        .flat_map(|course| {
            let course_id = course.course_id;
            course.tasks.into_iter().map(move |task| ProgressItem {
                course_id: course_id.clone(),
                task_id: task.task_id,
                progress: task.progress,
            })
        })
        .collect()
}
