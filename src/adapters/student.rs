use std::sync::Arc;

use chrono::Local;
use serde_json::json;
use tracing::{debug, warn};

use crate::core::backend::{NotificationKind, RatingSubmission, SessionBackend};
use crate::core::config::ClientConfig;
use crate::core::error::{TutoriaError, ValidationError};
use crate::core::session::{BookingRequest, Profile, Role, Session, TutorSearch, TutorSummary};
use crate::core::status::SessionStatus;
use crate::storage::Database;
use crate::sync::SyncBridge;

use super::{commit_status_change, SessionsView};

/// Profile plus a staleness flag: `stale` means the backend was unreachable
/// and this came from the local fallback cache.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub profile: Profile,
    pub stale: bool,
}

/// Row of the "próximas sesiones" dashboard card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingSession {
    pub id: String,
    pub title: String,
    pub tutor: String,
    pub modality: String,
    pub date: String,
    pub time: String,
    pub duration: String,
    pub status_label: &'static str,
    pub status_color: &'static str,
}

/// The student's side of the marketplace: profile, session list, booking,
/// cancellation, proposal responses and ratings.
///
/// All collaborators are injected; nothing here reaches for ambient state.
pub struct StudentView {
    backend: Arc<dyn SessionBackend>,
    db: Database,
    bridge: Arc<SyncBridge>,
    config: ClientConfig,
}

impl StudentView {
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        db: Database,
        bridge: Arc<SyncBridge>,
        config: ClientConfig,
    ) -> Self {
        Self {
            backend,
            db,
            bridge,
            config,
        }
    }

    /// Best-effort profile load: backend first, then the cached copy
    /// (marked stale), then a minimal profile from the identity blob.
    /// Never fails; every fallback is logged.
    pub async fn load_profile(&self, email: &str) -> ProfileView {
        match self.backend.fetch_profile(email).await {
            Ok(profile) => {
                if let Err(e) = self.db.identity().save_profile(&profile).await {
                    warn!("could not cache fetched profile: {e}");
                }
                ProfileView {
                    profile,
                    stale: false,
                }
            }
            Err(e) => {
                warn!("profile fetch failed, falling back to cache: {e}");
                self.profile_fallback(email).await
            }
        }
    }

    async fn profile_fallback(&self, email: &str) -> ProfileView {
        match self.db.identity().load_profile().await {
            Ok(Some((profile, stored_at))) => {
                debug!("serving profile cached at {stored_at}");
                return ProfileView {
                    profile,
                    stale: true,
                };
            }
            Ok(None) => {}
            Err(e) => warn!("profile cache unavailable: {e}"),
        }

        let full_name = match self.db.identity().load_identity().await {
            Ok(Some(identity)) => identity.full_name,
            _ => None,
        };
        let (first_name, last_name) = split_name(full_name.as_deref().unwrap_or(""));
        ProfileView {
            profile: Profile {
                first_name,
                last_name,
                email: email.to_string(),
                student_id: String::new(),
            },
            stale: true,
        }
    }

    /// Fetch the student's sessions. On success the list is mirrored into
    /// the cache; on failure the list is empty and `fetch_failed` is set,
    /// so stale data is never silently presented as fresh.
    pub async fn load_sessions(&self, email: &str) -> SessionsView {
        match self.backend.fetch_student_sessions(email).await {
            Ok(sessions) => {
                for session in &sessions {
                    if let Err(e) = self
                        .bridge
                        .apply_remote_session_update(session.clone())
                        .await
                    {
                        warn!("could not mirror session {} into cache: {e}", session.id);
                    }
                }
                SessionsView {
                    sessions,
                    fetch_failed: false,
                }
            }
            Err(e) => {
                warn!("session fetch failed: {e}");
                SessionsView {
                    sessions: Vec::new(),
                    fetch_failed: true,
                }
            }
        }
    }

    /// Submit a booking request. The backend assigns the id and the session
    /// starts out pending; the tutor is notified best-effort.
    pub async fn book_session(&self, booking: BookingRequest) -> Result<Session, TutoriaError> {
        booking.validate()?;

        let session = self.backend.create_session(&booking).await?;
        if let Err(e) = self.db.sessions().upsert_if_newer(&session).await {
            warn!("could not cache created session: {e}");
        }

        let payload = json!({
            "sessionId": session.id,
            "tutorId": session.tutor_id,
            "studentId": session.student_id,
        });
        if let Err(e) = self
            .backend
            .notify(NotificationKind::NewSessionRequest, payload)
            .await
        {
            warn!("new-session notification failed: {e}");
        }

        Ok(session)
    }

    /// Cancel a confirmed session. Only legal from `accepted`, student-side.
    pub async fn request_cancellation(
        &self,
        session_id: &str,
        reason: impl Into<String>,
    ) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;
        let mut updated = session.transition(SessionStatus::Cancelled, Role::Student)?;
        updated.reason = Some(reason.into());

        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Student,
        )
        .await
    }

    /// Accept the new time the tutor proposed for a postponed session. The
    /// proposed date/time become the scheduled ones.
    pub async fn accept_proposal(&self, session_id: &str) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;
        let mut updated = session.transition(SessionStatus::Accepted, Role::Student)?;
        if let (Some(date), Some(time)) = (updated.proposed_date.take(), updated.proposed_time.take())
        {
            updated.date = date;
            updated.time = time;
        }
        updated.proposal_message = None;

        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Student,
        )
        .await
    }

    /// Decline the tutor's proposal; the session ends rejected.
    pub async fn decline_proposal(
        &self,
        session_id: &str,
        reason: impl Into<String>,
    ) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;
        let mut updated = session.transition(SessionStatus::Rejected, Role::Student)?;
        updated.reason = Some(reason.into());

        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Student,
        )
        .await
    }

    /// Extension point: surfaces the intent on the bridge, no transition is
    /// performed.
    pub async fn request_reschedule(&self, session_id: &str) {
        debug!("reschedule requested for session {session_id}");
        self.bridge.request_reschedule(session_id);
    }

    /// Rate a completed session, 1..=5. Repeat submission overwrites the
    /// previous rating: one current rating per session.
    pub async fn submit_rating(
        &self,
        session_id: &str,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> Result<(), TutoriaError> {
        let rating = rating.ok_or(ValidationError::MissingField("rating"))?;
        if !(1..=5).contains(&rating) {
            return Err(ValidationError::RatingOutOfRange(rating).into());
        }

        let session = self.get_cached(session_id).await?;
        if session.status != SessionStatus::Completed {
            return Err(ValidationError::NotRatable(session.status).into());
        }

        let submission = RatingSubmission {
            session_id: session.id.clone(),
            student_id: session.student_id.clone(),
            tutor_id: session.tutor_id.clone(),
            rating,
            comment: comment.clone(),
        };
        self.backend.create_rating(&submission).await?;

        let mut updated = session;
        updated.rating = Some(rating);
        updated.rating_comment = comment;
        updated.updated_at = chrono::Utc::now();
        if let Err(e) = self.db.sessions().upsert_if_newer(&updated).await {
            warn!("could not cache rating: {e}");
        }
        Ok(())
    }

    /// Search tutors by availability filters. Empty list on failure, like
    /// every read path.
    pub async fn search_tutors(&self, search: &TutorSearch) -> Vec<TutorSummary> {
        match self.backend.search_tutors(search).await {
            Ok(tutors) => tutors,
            Err(e) => {
                warn!("tutor search failed: {e}");
                Vec::new()
            }
        }
    }

    /// Upcoming sessions for the dashboard card, from the cache: future
    /// only, soonest first, truncated to `limit`.
    pub async fn upcoming(&self, student_id: &str, limit: usize) -> Vec<UpcomingSession> {
        let sessions = match self.db.sessions().list_for_student(student_id).await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("could not read cached sessions: {e}");
                return Vec::new();
            }
        };

        let now = Local::now().naive_local();
        let mut future: Vec<Session> = sessions
            .into_iter()
            .filter(|s| s.scheduled_at().map(|at| at >= now).unwrap_or(false))
            .collect();
        future.sort_by_key(|s| s.scheduled_at());
        future.truncate(limit);

        future.into_iter().map(|s| upcoming_row(&s)).collect()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_cached(&self, session_id: &str) -> Result<Session, TutoriaError> {
        self.db
            .sessions()
            .get(session_id)
            .await
            .map_err(|_| TutoriaError::SessionNotFound(session_id.to_string()))
    }
}

fn upcoming_row(session: &Session) -> UpcomingSession {
    UpcomingSession {
        id: session.id.clone(),
        title: session
            .title
            .clone()
            .unwrap_or_else(|| "Sesión de apoyo".into()),
        tutor: session.tutor_name.clone().unwrap_or_else(|| "Tutor".into()),
        modality: session
            .modality
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "—".into()),
        date: display_date(&session.date),
        time: session.time.clone(),
        duration: session
            .duration_minutes
            .map(|d| format!("{d} min"))
            .unwrap_or_default(),
        status_label: session.status.label(Role::Student),
        status_color: session.status.color(),
    }
}

/// `YYYY-MM-DD` → `DD/MM/YYYY`, the format the dashboards show. Anything
/// unparseable passes through untouched.
fn display_date(date: &str) -> String {
    match chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%d/%m/%Y").to_string(),
        Err(_) => date.to_string(),
    }
}

fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = parts.collect();
    (first, rest.join(" "))
}
