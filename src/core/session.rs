use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{TransitionError, ValidationError};
use crate::core::status::SessionStatus;

/// Which side of the marketplace is acting. Wire form is the lowercase
/// string sent as `userType` on status updates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Presencial,
    Virtual,
}

impl Modality {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "presencial" => Some(Modality::Presencial),
            "virtual" => Some(Modality::Virtual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Presencial => "presencial",
            Modality::Virtual => "virtual",
        }
    }
}

/// One tutoring engagement between a student and a tutor.
///
/// The authoritative copy lives on the backend; instances held here are
/// re-fetchable display caches. `date` and `time` stay as the naive local
/// strings the backend sends (`YYYY-MM-DD`, `HH:MM`); no timezone
/// normalization happens in this layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub tutor_id: String,
    pub tutor_name: Option<String>,
    pub subject: String,
    pub title: Option<String>,
    pub date: String,
    pub time: String,
    pub duration_minutes: Option<u32>,
    pub modality: Option<Modality>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub objective: Option<String>,
    pub comments: Option<String>,
    pub status: SessionStatus,
    /// Reason attached when a session is rejected, declined or cancelled.
    pub reason: Option<String>,
    /// New time proposed by the tutor while the session is postponed.
    pub proposed_date: Option<String>,
    pub proposed_time: Option<String>,
    pub proposal_message: Option<String>,
    pub attended: Option<bool>,
    pub attendance_notes: Option<String>,
    pub rating: Option<u8>,
    pub rating_comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Move this session to `target` on behalf of `actor`.
    ///
    /// Pure: returns a new value with the status and `updated_at` replaced,
    /// leaving `self` untouched. The caller persists the result; nothing is
    /// written anywhere here.
    pub fn transition(&self, target: SessionStatus, actor: Role) -> Result<Session, TransitionError> {
        if !self.status.permitted_next().contains(&target) {
            return Err(TransitionError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        match SessionStatus::authorized_role(self.status, target) {
            Some(role) if role == actor => {}
            _ => {
                return Err(TransitionError::UnauthorizedActor {
                    role: actor,
                    from: self.status,
                    to: target,
                })
            }
        }

        let mut next = self.clone();
        next.status = target;
        next.updated_at = Utc::now();
        Ok(next)
    }

    /// Scheduled date+time as a naive timestamp, when both fields parse.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.time, "%H:%M:%S"))
            .ok()?;
        Some(date.and_time(time))
    }

    pub fn is_on_date(&self, date: &str) -> bool {
        self.date == date
    }
}

/// Student profile as served by `/auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Enrollment id; `matricula` on the wire.
    pub student_id: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_str(), self.last_name.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        parts.join(" ")
    }
}

/// Booking form payload: the student's request to create a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub student_id: String,
    pub student_name: Option<String>,
    pub tutor_id: String,
    pub tutor_name: Option<String>,
    pub subject: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: Option<u32>,
    pub modality: Option<Modality>,
    pub objective: Option<String>,
    pub location: Option<String>,
    pub comments: Option<String>,
}

impl BookingRequest {
    /// The fields the booking form requires before submission.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tutor_id.trim().is_empty() {
            return Err(ValidationError::MissingField("tutorId"));
        }
        if self.subject.trim().is_empty() {
            return Err(ValidationError::MissingField("subject"));
        }
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingField("date"));
        }
        if self.time.trim().is_empty() {
            return Err(ValidationError::MissingField("time"));
        }
        Ok(())
    }
}

/// Tutor record returned by the availability search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TutorSummary {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    pub reviews_count: u32,
    pub available: bool,
    pub next_available: Option<String>,
    pub modalities: Vec<String>,
    pub price: Option<f64>,
}

/// Filters for the tutor availability search. Empty fields are omitted from
/// the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TutorSearch {
    pub area: Option<String>,
    pub modality: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub duration: Option<String>,
}
