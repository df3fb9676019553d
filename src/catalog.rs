//! Course catalog client.
//!
//! Talks to the course manager service (which knows every course and where it
//! is served) and to the individual course services (which own task lists).
//! Every call is a single request with an explicit timeout; nothing is cached
//! or retried.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout {
                url: url.to_string(),
            }
        } else {
            CatalogError::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// A course as listed by the course manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CourseInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub url: String,
}

/// Where a course is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLocation {
    pub course_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct TaskInfo {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TaskGroup {
    #[serde(default)]
    tasks: Vec<TaskInfo>,
}

#[derive(Clone)]
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let base_url = trim_slashes(base_url.into());
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::from_reqwest(&base_url, e))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Look up the serving location of `course_id`.
    pub async fn resolve_course_location(&self, course_id: &str) -> Result<String, CatalogError> {
        let url = format!(
            "{}/courses/{}",
            self.base_url,
            urlencoding::encode(course_id)
        );
        let course: CourseInfo = self.get_json(&url).await?;
        Ok(trim_slashes(course.url))
    }

    /// Every known course in catalog order. Repeated ids keep their first entry.
    pub async fn list_all_course_locations(&self) -> Result<Vec<CourseLocation>, CatalogError> {
        let url = format!("{}/courses", self.base_url);
        let courses: Vec<CourseInfo> = self.get_json(&url).await?;

        let mut seen = HashSet::new();
        Ok(courses
            .into_iter()
            .filter(|course| seen.insert(course.id.clone()))
            .map(|course| CourseLocation {
                course_id: course.id,
                url: trim_slashes(course.url),
            })
            .collect())
    }

    /// Task ids offered at `location`, flattened from task groups in declaration order.
    pub async fn fetch_tasks(&self, location: &str) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}/tasks", location.trim_end_matches('/'));
        let groups: Vec<TaskGroup> = self.get_json(&url).await?;
        Ok(groups
            .into_iter()
            .flat_map(|group| group.tasks.into_iter().map(|task| task.id))
            .collect())
    }

    /// Call `{url}/health`; any 2xx counts as healthy.
    pub async fn check_health(&self, url: &str) -> Result<(), CatalogError> {
        let url = format!("{}/health", url.trim_end_matches('/'));
        self.get_success(&url).await.map(|_| ())
    }

    async fn get_success(&self, url: &str) -> Result<String, CatalogError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::from_reqwest(url, e))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| CatalogError::from_reqwest(url, e))?;
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status,
                body: text,
            });
        }
        Ok(text)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let text = self.get_success(url).await?;
        serde_json::from_str(&text).map_err(|source| CatalogError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

fn trim_slashes(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// A fake course manager + course services for tests, served over real HTTP.
#[cfg(test)]
pub(crate) mod mock {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct MockCatalogState {
        /// Ordered (course id, task groups as JSON)
        pub courses: Vec<(String, Value)>,
        /// Courses whose `/tasks` endpoint answers 500
        pub broken_tasks: Vec<String>,
        /// Courses whose `/health` endpoint answers 503
        pub unhealthy: Vec<String>,
        pub manager_unhealthy: bool,
        /// Delay applied to `/tasks` responses
        pub tasks_delay_ms: u64,
        pub base_url: String,
    }

    pub type SharedMock = Arc<Mutex<MockCatalogState>>;

    /// Task groups JSON with one group per slice.
    pub fn groups(groups: &[&[&str]]) -> Value {
        Value::Array(
            groups
                .iter()
                .enumerate()
                .map(|(i, ids)| {
                    json!({
                        "title": format!("Group {}", i + 1),
                        "tasks": ids
                            .iter()
                            .map(|id| json!({ "id": id, "title": format!("Task {}", id) }))
                            .collect::<Vec<_>>(),
                    })
                })
                .collect(),
        )
    }

    fn course_json(base: &str, id: &str) -> Value {
        json!({ "id": id, "name": format!("Course {}", id), "url": format!("{}/svc/{}/", base, id) })
    }

    async fn list_courses(State(state): State<SharedMock>) -> Json<Value> {
        let state = state.lock().unwrap();
        Json(Value::Array(
            state
                .courses
                .iter()
                .map(|(id, _)| course_json(&state.base_url, id))
                .collect(),
        ))
    }

    async fn get_course(State(state): State<SharedMock>, Path(id): Path<String>) -> Response {
        let state = state.lock().unwrap();
        if state.courses.iter().any(|(c, _)| *c == id) {
            Json(course_json(&state.base_url, &id)).into_response()
        } else {
            (StatusCode::NOT_FOUND, "no such course").into_response()
        }
    }

    async fn course_tasks(State(state): State<SharedMock>, Path(id): Path<String>) -> Response {
        let (delay, found, broken) = {
            let state = state.lock().unwrap();
            let found = state
                .courses
                .iter()
                .find(|(c, _)| *c == id)
                .map(|(_, groups)| groups.clone());
            (
                state.tasks_delay_ms,
                found,
                state.broken_tasks.contains(&id),
            )
        };
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        if broken {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        match found {
            Some(groups) => Json(groups).into_response(),
            None => (StatusCode::NOT_FOUND, "no such course").into_response(),
        }
    }

    async fn course_health(State(state): State<SharedMock>, Path(id): Path<String>) -> StatusCode {
        if state.lock().unwrap().unhealthy.contains(&id) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }

    async fn manager_health(State(state): State<SharedMock>) -> StatusCode {
        if state.lock().unwrap().manager_unhealthy {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }

    /// Serve the mock on an ephemeral port and return its base URL.
    pub async fn spawn(courses: Vec<(&str, Value)>) -> (String, SharedMock) {
        let state: SharedMock = Arc::new(Mutex::new(MockCatalogState {
            courses: courses
                .into_iter()
                .map(|(id, groups)| (id.to_string(), groups))
                .collect(),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/health", get(manager_health))
            .route("/courses", get(list_courses))
            .route("/courses/:id", get(get_course))
            .route("/svc/:id/tasks", get(course_tasks))
            .route("/svc/:id/health", get(course_health))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock catalog");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        state.lock().unwrap().base_url = base_url.clone();

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock catalog server");
        });

        (base_url, state)
    }
}
