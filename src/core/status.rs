use serde::{Deserialize, Serialize};

use crate::core::error::TransitionError;
use crate::core::session::Role;

/// Lifecycle status of a tutoring session.
///
/// The wire form is the lowercase English string. The backend sometimes says
/// `confirmed` where it means `accepted`; `parse` folds that alias in. Any
/// other string fails closed with `UnknownStatus`: transition logic never
/// guesses a status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Accepted,
    Rejected,
    Postponed,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn parse(s: &str) -> Result<Self, TransitionError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SessionStatus::Pending),
            "accepted" | "confirmed" => Ok(SessionStatus::Accepted),
            "rejected" => Ok(SessionStatus::Rejected),
            "postponed" => Ok(SessionStatus::Postponed),
            "completed" => Ok(SessionStatus::Completed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Accepted => "accepted",
            SessionStatus::Rejected => "rejected",
            SessionStatus::Postponed => "postponed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses this one may move to. Empty for terminal statuses.
    pub fn permitted_next(&self) -> &'static [SessionStatus] {
        match self {
            SessionStatus::Pending => &[
                SessionStatus::Accepted,
                SessionStatus::Rejected,
                SessionStatus::Postponed,
            ],
            SessionStatus::Postponed => &[SessionStatus::Accepted, SessionStatus::Rejected],
            SessionStatus::Accepted => &[SessionStatus::Completed, SessionStatus::Cancelled],
            SessionStatus::Rejected | SessionStatus::Cancelled | SessionStatus::Completed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Rejected | SessionStatus::Cancelled)
    }

    /// The single role allowed to request a given edge, or None when the edge
    /// does not exist. Pending requests are the tutor's to answer; a postponed
    /// proposal is the student's to answer; the student cancels, the tutor
    /// closes out.
    pub fn authorized_role(from: SessionStatus, to: SessionStatus) -> Option<Role> {
        use SessionStatus::*;
        match (from, to) {
            (Pending, Accepted) | (Pending, Rejected) | (Pending, Postponed) => Some(Role::Tutor),
            (Postponed, Accepted) | (Postponed, Rejected) => Some(Role::Student),
            (Accepted, Completed) => Some(Role::Tutor),
            (Accepted, Cancelled) => Some(Role::Student),
            _ => None,
        }
    }

    /// Human-readable label shown to the given role.
    pub fn label(&self, role: Role) -> &'static str {
        match (self, role) {
            (SessionStatus::Pending, Role::Student) => "Solicitud enviada - Esperando respuesta",
            (SessionStatus::Pending, Role::Tutor) => "Revisar solicitud",
            (SessionStatus::Accepted, Role::Student) => {
                "Sesión confirmada - Preparar para la sesión"
            }
            (SessionStatus::Accepted, Role::Tutor) => "Preparar materiales",
            (SessionStatus::Rejected, Role::Student) => "Sesión rechazada - Buscar otro tutor",
            (SessionStatus::Rejected, Role::Tutor) => "Sesión rechazada",
            (SessionStatus::Postponed, Role::Student) => {
                "Sesión pospuesta - Revisar nueva propuesta"
            }
            (SessionStatus::Postponed, Role::Tutor) => "Proponer nuevo horario",
            (SessionStatus::Completed, Role::Student) => {
                "Sesión completada - Valorar experiencia"
            }
            (SessionStatus::Completed, Role::Tutor) => "Sesión completada",
            (SessionStatus::Cancelled, _) => "Sesión cancelada",
        }
    }

    /// Display color used by both dashboards.
    pub fn color(&self) -> &'static str {
        match self {
            SessionStatus::Pending | SessionStatus::Postponed => "#ffc107",
            SessionStatus::Accepted => "#28a745",
            SessionStatus::Rejected => "#dc3545",
            SessionStatus::Completed => "#17a2b8",
            SessionStatus::Cancelled => "#6c757d",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering-only label lookup for raw status strings. Unknown strings fall
/// back to "Estado Desconocido"; this fallback is never acceptable for
/// transition logic, which goes through `SessionStatus::parse` instead.
pub fn display_label(raw: &str, role: Role) -> &'static str {
    match SessionStatus::parse(raw) {
        Ok(status) => status.label(role),
        Err(_) => "Estado Desconocido",
    }
}
