use chrono::Utc;

use super::config::ClientConfig;
use super::error::{TransitionError, ValidationError};
use super::session::*;
use super::status::{display_label, SessionStatus};

fn sample_session(status: SessionStatus) -> Session {
    let now = Utc::now();
    Session {
        id: "s-1".into(),
        student_id: "al-2024001234".into(),
        student_name: Some("Jair Serralta".into()),
        tutor_id: "tu-77".into(),
        tutor_name: Some("Dr. Carlos López".into()),
        subject: "Matemáticas".into(),
        title: Some("Repaso de cálculo".into()),
        date: "2025-10-05".into(),
        time: "10:00".into(),
        duration_minutes: Some(60),
        modality: Some(Modality::Virtual),
        location: None,
        link: Some("https://meet.example.com/abc".into()),
        objective: None,
        comments: None,
        status,
        reason: None,
        proposed_date: None,
        proposed_time: None,
        proposal_message: None,
        attended: None,
        attendance_notes: None,
        rating: None,
        rating_comment: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_permitted_next_table() {
    assert_eq!(
        SessionStatus::Pending.permitted_next(),
        &[
            SessionStatus::Accepted,
            SessionStatus::Rejected,
            SessionStatus::Postponed
        ]
    );
    assert_eq!(
        SessionStatus::Postponed.permitted_next(),
        &[SessionStatus::Accepted, SessionStatus::Rejected]
    );
    assert_eq!(
        SessionStatus::Accepted.permitted_next(),
        &[SessionStatus::Completed, SessionStatus::Cancelled]
    );
    assert!(SessionStatus::Rejected.permitted_next().is_empty());
    assert!(SessionStatus::Cancelled.permitted_next().is_empty());
    assert!(SessionStatus::Completed.permitted_next().is_empty());
}

#[test]
fn test_transition_success_is_pure() {
    let session = sample_session(SessionStatus::Pending);
    let accepted = session
        .transition(SessionStatus::Accepted, Role::Tutor)
        .unwrap();

    assert_eq!(accepted.status, SessionStatus::Accepted);
    assert!(accepted.updated_at >= session.updated_at);
    // the input is untouched
    assert_eq!(session.status, SessionStatus::Pending);
}

#[test]
fn test_transition_rejects_illegal_edge() {
    let session = sample_session(SessionStatus::Pending);
    let err = session
        .transition(SessionStatus::Completed, Role::Tutor)
        .unwrap_err();
    assert_eq!(
        err,
        TransitionError::InvalidTransition {
            from: SessionStatus::Pending,
            to: SessionStatus::Completed,
        }
    );
    assert_eq!(session.status, SessionStatus::Pending);
}

#[test]
fn test_transition_rejects_wrong_role() {
    // only the tutor answers a pending request
    let pending = sample_session(SessionStatus::Pending);
    let err = pending
        .transition(SessionStatus::Accepted, Role::Student)
        .unwrap_err();
    assert!(matches!(err, TransitionError::UnauthorizedActor { .. }));

    // only the student cancels a confirmed session
    let accepted = sample_session(SessionStatus::Accepted);
    let err = accepted
        .transition(SessionStatus::Cancelled, Role::Tutor)
        .unwrap_err();
    assert!(matches!(err, TransitionError::UnauthorizedActor { .. }));

    // the tutor cannot re-reject a proposal they made
    let postponed = sample_session(SessionStatus::Postponed);
    let err = postponed
        .transition(SessionStatus::Rejected, Role::Tutor)
        .unwrap_err();
    assert!(matches!(err, TransitionError::UnauthorizedActor { .. }));
}

#[test]
fn test_terminal_statuses_are_absorbing() {
    let all = [
        SessionStatus::Pending,
        SessionStatus::Accepted,
        SessionStatus::Rejected,
        SessionStatus::Postponed,
        SessionStatus::Completed,
        SessionStatus::Cancelled,
    ];
    for terminal in [SessionStatus::Rejected, SessionStatus::Cancelled] {
        let session = sample_session(terminal);
        for target in all {
            for role in [Role::Student, Role::Tutor] {
                assert!(
                    session.transition(target, role).is_err(),
                    "{terminal} -> {target} as {role} should fail"
                );
            }
        }
    }
}

#[test]
fn test_status_parse_fails_closed() {
    let err = SessionStatus::parse("rescheduled").unwrap_err();
    assert_eq!(err, TransitionError::UnknownStatus("rescheduled".into()));
    assert!(SessionStatus::parse("").is_err());
}

#[test]
fn test_status_parse_confirmed_alias() {
    assert_eq!(
        SessionStatus::parse("confirmed").unwrap(),
        SessionStatus::Accepted
    );
    assert_eq!(
        SessionStatus::parse(" Pending ").unwrap(),
        SessionStatus::Pending
    );
}

#[test]
fn test_labels_per_role() {
    assert_eq!(
        SessionStatus::Accepted.label(Role::Student),
        "Sesión confirmada - Preparar para la sesión"
    );
    assert_eq!(SessionStatus::Accepted.label(Role::Tutor), "Preparar materiales");
    assert_eq!(
        SessionStatus::Pending.label(Role::Tutor),
        "Revisar solicitud"
    );
}

#[test]
fn test_display_label_unknown_fallback() {
    assert_eq!(display_label("whatever", Role::Student), "Estado Desconocido");
    assert_eq!(
        display_label("confirmed", Role::Student),
        "Sesión confirmada - Preparar para la sesión"
    );
}

#[test]
fn test_status_colors() {
    assert_eq!(SessionStatus::Pending.color(), "#ffc107");
    assert_eq!(SessionStatus::Postponed.color(), "#ffc107");
    assert_eq!(SessionStatus::Accepted.color(), "#28a745");
    assert_eq!(SessionStatus::Rejected.color(), "#dc3545");
    assert_eq!(SessionStatus::Completed.color(), "#17a2b8");
    assert_eq!(SessionStatus::Cancelled.color(), "#6c757d");
}

#[test]
fn test_status_wire_form() {
    let json = serde_json::to_string(&SessionStatus::Postponed).unwrap();
    assert_eq!(json, "\"postponed\"");
    let parsed: SessionStatus = serde_json::from_str("\"cancelled\"").unwrap();
    assert_eq!(parsed, SessionStatus::Cancelled);
}

#[test]
fn test_role_wire_form() {
    assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
    assert_eq!(Role::Tutor.to_string(), "tutor");
}

#[test]
fn test_scheduled_at_parsing() {
    let session = sample_session(SessionStatus::Pending);
    let at = session.scheduled_at().unwrap();
    assert_eq!(at.to_string(), "2025-10-05 10:00:00");

    let mut bad = sample_session(SessionStatus::Pending);
    bad.date = "05/10/2025".into();
    assert!(bad.scheduled_at().is_none());
}

#[test]
fn test_booking_validation() {
    let booking = BookingRequest {
        student_id: "al-1".into(),
        student_name: None,
        tutor_id: "tu-77".into(),
        tutor_name: None,
        subject: "Física".into(),
        date: "2025-11-01".into(),
        time: "09:00".into(),
        duration_minutes: Some(90),
        modality: Some(Modality::Presencial),
        objective: None,
        location: Some("Biblioteca, sala 2".into()),
        comments: None,
    };
    assert!(booking.validate().is_ok());

    let mut missing = booking.clone();
    missing.tutor_id = "".into();
    assert_eq!(
        missing.validate().unwrap_err(),
        ValidationError::MissingField("tutorId")
    );

    let mut missing = booking;
    missing.date = "  ".into();
    assert_eq!(
        missing.validate().unwrap_err(),
        ValidationError::MissingField("date")
    );
}

#[test]
fn test_profile_full_name() {
    let profile = Profile {
        first_name: "Jair".into(),
        last_name: "Serralta".into(),
        email: "jair.serralta@estudiante.edu".into(),
        student_id: "2024001234".into(),
    };
    assert_eq!(profile.full_name(), "Jair Serralta");

    let only_first = Profile {
        first_name: "Jair".into(),
        last_name: "".into(),
        email: "".into(),
        student_id: "".into(),
    };
    assert_eq!(only_first.full_name(), "Jair");
}

#[test]
fn test_config_defaults() {
    let config = ClientConfig::default();
    assert_eq!(config.base_url, "http://localhost:4000");
    assert_eq!(config.request_timeout_secs, 15);
    assert_eq!(config.rules.min_notice_hours, 12);
    assert_eq!(config.rules.max_daily_sessions, 8);
    assert_eq!(config.sync.student_poll_secs, 30);
    assert_eq!(config.sync.tutor_poll_secs, 60);
    assert_eq!(config.data_dir, ".tutoria");
    assert!(!config.debug);
}
