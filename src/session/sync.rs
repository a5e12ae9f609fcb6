//! Best-effort client for the remote progress and analytics endpoints.

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use url::Url;

use crate::pipeline::ClientError;

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    user_id: i64,
    course_id: &'a str,
    lesson_id: &'a str,
    accuracy: f64,
}

#[derive(Debug, Serialize)]
struct EventRequest<'a> {
    user_id: i64,
    event_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lesson_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

/// Aggregate practice statistics for one user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub total_detections: u64,
    #[serde(default)]
    pub average_accuracy: f64,
    #[serde(default)]
    pub completed_lessons: u32,
    #[serde(default)]
    pub total_lessons: u32,
}

/// One lesson as reported by the remote progress service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteLesson {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub successful_detections: u32,
    #[serde(default)]
    pub best_accuracy: f64,
}

/// One course with its lesson breakdown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CourseProgress {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub lessons: Vec<RemoteLesson>,
}

/// Complete remote progress view for one user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProgress {
    pub user_id: i64,
    #[serde(default)]
    pub courses: Vec<CourseProgress>,
}

/// Client for the remote progress service, bound to one user.
///
/// The user identity is an explicit constructor parameter, never an ambient
/// lookup. All writes here are advisory analytics: the local
/// [`ProgressStore`](crate::session::ProgressStore) remains the source of
/// truth, and a failed sync is never rolled back or surfaced.
#[derive(Debug, Clone)]
pub struct SyncClient {
    http: reqwest::Client,
    base_url: Url,
    user_id: i64,
}

impl SyncClient {
    pub fn new(base_url: &str, user_id: i64) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            user_id,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// POST `/progress/lesson/complete` for this user.
    pub async fn lesson_complete(
        &self,
        course_id: &str,
        lesson_id: &str,
        accuracy: f64,
    ) -> Result<(), ClientError> {
        let url = self.base_url.join("progress/lesson/complete")?;
        let response = self
            .http
            .post(url)
            .json(&CompleteRequest {
                user_id: self.user_id,
                course_id,
                lesson_id,
                accuracy,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(())
    }

    /// Queue [`lesson_complete`](Self::lesson_complete) as an independent
    /// task. Failures are logged, never surfaced; local state stays
    /// untouched either way.
    pub fn spawn_lesson_complete(
        &self,
        course_id: impl Into<String>,
        lesson_id: impl Into<String>,
        accuracy: f64,
    ) -> JoinHandle<()> {
        let client = self.clone();
        let course_id = course_id.into();
        let lesson_id = lesson_id.into();
        tokio::spawn(async move {
            if let Err(err) = client.lesson_complete(&course_id, &lesson_id, accuracy).await {
                tracing::warn!(%err, %course_id, %lesson_id, "progress sync failed");
            }
        })
    }

    /// POST one analytics event to `/log`.
    pub async fn log_event(
        &self,
        event_type: &str,
        lesson_id: Option<&str>,
        detail: Option<&str>,
    ) -> Result<(), ClientError> {
        let url = self.base_url.join("log")?;
        let response = self
            .http
            .post(url)
            .json(&EventRequest {
                user_id: self.user_id,
                event_type,
                lesson_id,
                detail,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(())
    }

    /// Fire-and-forget variant of [`log_event`](Self::log_event).
    pub fn spawn_log_event(
        &self,
        event_type: impl Into<String>,
        lesson_id: Option<String>,
        detail: Option<String>,
    ) -> JoinHandle<()> {
        let client = self.clone();
        let event_type = event_type.into();
        tokio::spawn(async move {
            if let Err(err) = client
                .log_event(&event_type, lesson_id.as_deref(), detail.as_deref())
                .await
            {
                tracing::debug!(%err, %event_type, "event log failed");
            }
        })
    }

    /// GET `/progress/user/{id}` — full course/lesson breakdown.
    pub async fn user_progress(&self) -> Result<UserProgress, ClientError> {
        let url = self
            .base_url
            .join(&format!("progress/user/{}", self.user_id))?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// GET `/progress/user/{id}/stats` — aggregate statistics.
    pub async fn user_stats(&self) -> Result<UserStats, ClientError> {
        let url = self
            .base_url
            .join(&format!("progress/user/{}/stats", self.user_id))?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        Ok(response.json().await?)
    }
}
