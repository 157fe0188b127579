use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;

use crate::core::backend::SessionBackend;
use crate::core::config::{ClientConfig, RuleConfig};
use crate::core::error::{ScheduleError, TutoriaError, ValidationError};
use crate::core::session::{Role, Session};
use crate::core::status::SessionStatus;
use crate::storage::Database;
use crate::sync::SyncBridge;

use super::{commit_status_change, SessionsView};

/// Tutor-side grouping of sessions for display. Membership is computed by
/// filtering on status; there is no second stored field to drift from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Pending,
    Confirmed,
    Rejected,
    Completed,
}

impl Bucket {
    pub fn status(&self) -> SessionStatus {
        match self {
            Bucket::Pending => SessionStatus::Pending,
            Bucket::Confirmed => SessionStatus::Accepted,
            Bucket::Rejected => SessionStatus::Rejected,
            Bucket::Completed => SessionStatus::Completed,
        }
    }
}

/// The tutor's side of the marketplace: request triage, scheduling
/// proposals and attendance.
pub struct TutorView {
    backend: Arc<dyn SessionBackend>,
    db: Database,
    bridge: Arc<SyncBridge>,
    config: ClientConfig,
}

impl TutorView {
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

    /// Fetch the tutor's sessions and keep the ones in `bucket`. On fetch
    /// failure the bucket is served from the local cache with
    /// `fetch_failed` set, so the caller can mark it stale.
    pub async fn load_sessions_by_bucket(&self, tutor_id: &str, bucket: Bucket) -> SessionsView {
        match self.backend.fetch_tutor_sessions(tutor_id).await {
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
                    sessions: filter_bucket(sessions, bucket),
                    fetch_failed: false,
                }
            }
            Err(e) => {
                warn!("tutor session fetch failed, serving cached bucket: {e}");
                let cached = self
                    .db
                    .sessions()
                    .list_for_tutor(tutor_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("session cache unavailable: {e}");
                        Vec::new()
                    });
                SessionsView {
                    sessions: filter_bucket(cached, bucket),
                    fetch_failed: true,
                }
            }
        }
    }

    /// Accept a pending request. The per-tutor daily cap applies: the
    /// request's date must still have room among already-accepted sessions.
    pub async fn accept_request(&self, session_id: &str) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;

        let accepted_that_day = self
            .db
            .sessions()
            .count_for_tutor_on(&session.tutor_id, &session.date, SessionStatus::Accepted)
            .await?;
        let limit = self.config.rules.max_daily_sessions;
        if accepted_that_day >= limit {
            return Err(ScheduleError::DailyLimitExceeded { limit }.into());
        }

        let updated = session.transition(SessionStatus::Accepted, Role::Tutor)?;
        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Tutor,
        )
        .await
    }

    /// Reject a pending request, recording the reason on the session.
    pub async fn reject_request(
        &self,
        session_id: &str,
        reason: impl Into<String>,
    ) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;
        let mut updated = session.transition(SessionStatus::Rejected, Role::Tutor)?;
        updated.reason = Some(reason.into());

        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Tutor,
        )
        .await
    }

    /// Propose a new time for a pending request. The scheduling rules run
    /// first; only a valid proposal moves the session to postponed for the
    /// student to review.
    pub async fn propose_new_time(
        &self,
        session_id: &str,
        new_date: &str,
        new_time: &str,
        message: impl Into<String>,
    ) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;

        let accepted_that_day = self
            .db
            .sessions()
            .count_for_tutor_on(&session.tutor_id, new_date, SessionStatus::Accepted)
            .await?;
        validate_reschedule_rules(
            new_date,
            new_time,
            accepted_that_day,
            Local::now().naive_local(),
            &self.config.rules,
        )?;

        let mut updated = session.transition(SessionStatus::Postponed, Role::Tutor)?;
        updated.proposed_date = Some(new_date.to_string());
        updated.proposed_time = Some(new_time.to_string());
        updated.proposal_message = Some(message.into());

        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Tutor,
        )
        .await
    }

    /// Record whether the student showed up. Only legal for accepted
    /// sessions; closes the session out as completed.
    pub async fn mark_attendance(
        &self,
        session_id: &str,
        attended: bool,
        notes: Option<String>,
    ) -> Result<Session, TutoriaError> {
        let session = self.get_cached(session_id).await?;
        if session.status != SessionStatus::Accepted {
            return Err(ValidationError::NotCompletable(session.status).into());
        }

        let mut updated = session.transition(SessionStatus::Completed, Role::Tutor)?;
        updated.attended = Some(attended);
        updated.attendance_notes = notes;

        commit_status_change(
            &self.backend,
            &self.bridge,
            updated,
            session.status,
            Role::Tutor,
        )
        .await
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

fn filter_bucket(sessions: Vec<Session>, bucket: Bucket) -> Vec<Session> {
    sessions
        .into_iter()
        .filter(|s| s.status == bucket.status())
        .collect()
}

/// Scheduling rules for a proposed session time, checked in a fixed order:
/// past date, then minimum notice, then the daily cap. Unparseable
/// date/time proposals fail closed as past dates.
pub fn validate_reschedule_rules(
    new_date: &str,
    new_time: &str,
    scheduled_that_day: u32,
    now: NaiveDateTime,
    rules: &RuleConfig,
) -> Result<(), ScheduleError> {
    let proposed = parse_proposal(new_date, new_time).ok_or(ScheduleError::PastDate)?;

    if proposed <= now {
        return Err(ScheduleError::PastDate);
    }
    if proposed - now < Duration::hours(rules.min_notice_hours as i64) {
        return Err(ScheduleError::InsufficientNotice {
            required_hours: rules.min_notice_hours,
        });
    }
    if scheduled_that_day >= rules.max_daily_sessions {
        return Err(ScheduleError::DailyLimitExceeded {
            limit: rules.max_daily_sessions,
        });
    }
    Ok(())
}

fn parse_proposal(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time))
}
