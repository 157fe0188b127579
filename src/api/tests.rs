use serde_json::json;

use super::normalize::*;
use crate::core::session::Modality;
use crate::core::status::SessionStatus;

#[test]
fn test_normalize_session_canonical_fields() {
    let record = json!({
        "id": "s-9",
        "studentId": "al-1",
        "tutorId": "tu-2",
        "tutorName": "Dra. María García",
        "subject": "Cálculo",
        "date": "2025-10-05",
        "time": "10:00",
        "duration": 60,
        "modality": "virtual",
        "link": "https://meet.example.com/xyz",
        "status": "pending",
        "updatedAt": "2025-10-01T12:00:00Z"
    });

    let session = normalize_session(&record).unwrap();
    assert_eq!(session.id, "s-9");
    assert_eq!(session.student_id, "al-1");
    assert_eq!(session.tutor_id, "tu-2");
    assert_eq!(session.tutor_name.as_deref(), Some("Dra. María García"));
    assert_eq!(session.date, "2025-10-05");
    assert_eq!(session.time, "10:00");
    assert_eq!(session.duration_minutes, Some(60));
    assert_eq!(session.modality, Some(Modality::Virtual));
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.updated_at.to_rfc3339(), "2025-10-01T12:00:00+00:00");
}

#[test]
fn test_normalize_session_spanish_aliases() {
    let record = json!({
        "sessionId": 42,
        "student_id": "al-1",
        "tutor_id": "tu-2",
        "tutor_nombre": "Dr. Carlos López",
        "area": "Matemáticas",
        "titulo": "Repaso",
        "fecha": "2025-10-06",
        "hora": "16:30",
        "duracion": "90",
        "modalidad": "Presencial",
        "ubicacion": "Biblioteca",
        "estado": "confirmed",
        "motivo": null
    });

    let session = normalize_session(&record).unwrap();
    // numeric ids are stringified, numeric strings parse as numbers
    assert_eq!(session.id, "42");
    assert_eq!(session.tutor_name.as_deref(), Some("Dr. Carlos López"));
    assert_eq!(session.subject, "Matemáticas");
    assert_eq!(session.title.as_deref(), Some("Repaso"));
    assert_eq!(session.date, "2025-10-06");
    assert_eq!(session.time, "16:30");
    assert_eq!(session.duration_minutes, Some(90));
    assert_eq!(session.modality, Some(Modality::Presencial));
    assert_eq!(session.location.as_deref(), Some("Biblioteca"));
    // "confirmed" is an alias of accepted
    assert_eq!(session.status, SessionStatus::Accepted);
}

#[test]
fn test_normalize_session_fails_closed_on_unknown_status() {
    let record = json!({ "id": "s-1", "status": "archived" });
    assert!(normalize_session(&record).is_err());

    let record = json!({ "id": "s-1" });
    assert!(normalize_session(&record).is_err(), "missing status must not default");
}

#[test]
fn test_normalize_sessions_drops_malformed_records() {
    let records = vec![
        json!({ "id": "s-1", "status": "pending" }),
        json!({ "id": "s-2", "status": "archived" }),
        json!({ "status": "pending" }),
        json!({ "id": "s-3", "status": "completed" }),
    ];
    let sessions = normalize_sessions(&records);
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, "s-1");
    assert_eq!(sessions[1].id, "s-3");
}

#[test]
fn test_normalize_round_trip_no_data_loss() {
    // A record normalized from aliases serializes back with every scheduling
    // field intact.
    let record = json!({
        "id": "s-5",
        "studentId": "al-9",
        "tutorId": "tu-3",
        "fecha": "2025-12-01",
        "hora": "08:00",
        "modalidad": "virtual",
        "status": "pending"
    });
    let session = normalize_session(&record).unwrap();
    let json = serde_json::to_value(&session).unwrap();
    let again = normalize_session(&json).unwrap();

    assert_eq!(again.id, "s-5");
    assert_eq!(again.student_id, "al-9");
    assert_eq!(again.tutor_id, "tu-3");
    assert_eq!(again.date, "2025-12-01");
    assert_eq!(again.time, "08:00");
    assert_eq!(again.modality, Some(Modality::Virtual));
    assert_eq!(again.status, session.status);
}

#[test]
fn test_normalize_profile_matricula_aliases() {
    let profile = normalize_profile(
        &json!({ "firstName": "Jair", "lastName": "Serralta", "matricula": "2024001234" }),
        "jair.serralta@estudiante.edu",
    );
    assert_eq!(profile.first_name, "Jair");
    assert_eq!(profile.student_id, "2024001234");
    // email falls back to the one we queried with
    assert_eq!(profile.email, "jair.serralta@estudiante.edu");
}

#[test]
fn test_normalize_tutor_defaults() {
    let tutor = normalize_tutor(&json!({
        "id": "tu-1",
        "nombre": "Dra. María García",
        "especialidad": "Apoyo General",
        "promedio": 4.5,
        "num_reviews": 12,
        "modalidades": ["virtual"]
    }))
    .unwrap();
    assert_eq!(tutor.name, "Dra. María García");
    assert_eq!(tutor.specialty, "Apoyo General");
    assert!((tutor.rating - 4.5).abs() < f64::EPSILON);
    assert_eq!(tutor.reviews_count, 12);
    assert!(tutor.available);
    assert_eq!(tutor.modalities, vec!["virtual"]);

    // no id, no record
    assert!(normalize_tutor(&json!({ "nombre": "X" })).is_none());
}

#[test]
fn test_unwrap_list_shapes() {
    let bare = json!([{ "id": 1 }, { "id": 2 }]);
    assert_eq!(unwrap_list(bare, "sessions").len(), 2);

    let wrapped = json!({ "sessions": [{ "id": 1 }] });
    assert_eq!(unwrap_list(wrapped, "sessions").len(), 1);

    let neither = json!({ "ok": true });
    assert!(unwrap_list(neither, "sessions").is_empty());
}
