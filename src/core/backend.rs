use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::ApiError;
use crate::core::session::{BookingRequest, Profile, Role, Session, TutorSearch, TutorSummary};
use crate::core::status::SessionStatus;

/// Body of `PUT /sessions/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(skip)]
    pub session_id: String,
    pub status: SessionStatus,
    pub user_id: String,
    pub user_type: Role,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /ratings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub session_id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Best-effort side notifications. Each maps to a `/notifications/*` path;
/// delivery failure never fails the operation that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NewSessionRequest,
    SessionStatusChange,
}

impl NotificationKind {
    pub fn path(&self) -> &'static str {
        match self {
            NotificationKind::NewSessionRequest => "/notifications/new-session-request",
            NotificationKind::SessionStatusChange => "/notifications/session-status-change",
        }
    }
}

/// The backend REST surface this layer consumes. Adapters and the poller
/// hold an `Arc<dyn SessionBackend>`; tests substitute an in-memory fake.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn fetch_profile(&self, email: &str) -> Result<Profile, ApiError>;

    async fn fetch_student_sessions(&self, email: &str) -> Result<Vec<Session>, ApiError>;

    async fn fetch_tutor_sessions(&self, tutor_id: &str) -> Result<Vec<Session>, ApiError>;

    /// Create a session from a booking request. The backend assigns the id
    /// and initializes the status to `pending`.
    async fn create_session(&self, booking: &BookingRequest) -> Result<Session, ApiError>;

    /// Persist a status transition. Local caches must only be touched after
    /// this confirms.
    async fn update_session_status(&self, update: &StatusUpdate) -> Result<(), ApiError>;

    async fn create_rating(&self, rating: &RatingSubmission) -> Result<(), ApiError>;

    async fn search_tutors(&self, search: &TutorSearch) -> Result<Vec<TutorSummary>, ApiError>;

    async fn notify(
        &self,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Result<(), ApiError>;
}
