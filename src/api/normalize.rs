use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::core::error::{ApiError, TutoriaError};
use crate::core::session::{Modality, Profile, Session, TutorSummary};
use crate::core::status::SessionStatus;

/// Normalization of backend records into the canonical shapes.
///
/// Field names vary across backend revisions (`date`/`fecha`/`startDate`,
/// `tutor`/`tutorName`/`tutor_nombre`, ...). All known aliases are resolved
/// here, once; nothing deeper in the crate branches on alias presence.

pub fn normalize_session(value: &Value) -> Result<Session, TutoriaError> {
    let id = str_field(value, &["id", "sessionId"])
        .ok_or_else(|| ApiError::Decode("session record without id".into()))?;

    let raw_status = str_field(value, &["status", "estado"])
        .ok_or_else(|| ApiError::Decode(format!("session {id} without status")))?;
    // Fail closed: an unrecognized status never becomes a guessed one.
    let status = SessionStatus::parse(&raw_status)?;

    let created_at = datetime_field(value, &["createdAt", "created_at"]).unwrap_or_else(Utc::now);
    let updated_at = datetime_field(value, &["updatedAt", "updated_at", "timestamp"])
        .unwrap_or(created_at);

    Ok(Session {
        id,
        student_id: str_field(value, &["studentId", "student_id"]).unwrap_or_default(),
        student_name: str_field(value, &["studentName", "student_name"]),
        tutor_id: str_field(value, &["tutorId", "tutor_id"]).unwrap_or_default(),
        tutor_name: str_field(value, &["tutor", "tutorName", "tutor_nombre"]),
        subject: str_field(value, &["subject", "area", "materia"]).unwrap_or_default(),
        title: str_field(value, &["title", "titulo"]),
        date: str_field(value, &["date", "fecha", "startDate"]).unwrap_or_default(),
        time: str_field(value, &["time", "hora"]).unwrap_or_default(),
        duration_minutes: u32_field(value, &["duration", "duracion"]),
        modality: str_field(value, &["modality", "modalidad"])
            .as_deref()
            .and_then(Modality::parse),
        location: str_field(value, &["location", "ubicacion"]),
        link: str_field(value, &["link", "enlace"]),
        objective: str_field(value, &["objective", "objetivo"]),
        comments: str_field(value, &["comments", "comentarios"]),
        status,
        reason: str_field(value, &["reason", "motivo"]),
        proposed_date: str_field(value, &["proposedDate", "proposed_date"]),
        proposed_time: str_field(value, &["proposedTime", "proposed_time"]),
        proposal_message: str_field(value, &["proposalMessage", "proposal_message"]),
        attended: value.get("attended").and_then(Value::as_bool),
        attendance_notes: str_field(value, &["attendanceNotes", "attendance_notes", "notes"]),
        rating: u32_field(value, &["rating", "calificacion"]).map(|r| r.min(u8::MAX as u32) as u8),
        rating_comment: str_field(value, &["comment", "comentario"]),
        created_at,
        updated_at,
    })
}

/// Normalize a list of session records, dropping malformed ones with a
/// warning. Fetch callers get every record that parses, never a guess.
pub fn normalize_sessions(values: &[Value]) -> Vec<Session> {
    values
        .iter()
        .filter_map(|v| match normalize_session(v) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("dropping malformed session record: {e}");
                None
            }
        })
        .collect()
}

pub fn normalize_profile(value: &Value, fallback_email: &str) -> Profile {
    Profile {
        first_name: str_field(value, &["firstName", "first_name", "nombre"]).unwrap_or_default(),
        last_name: str_field(value, &["lastName", "last_name", "apellido"]).unwrap_or_default(),
        email: str_field(value, &["email", "correo"])
            .unwrap_or_else(|| fallback_email.to_string()),
        student_id: str_field(value, &["studentId", "matricula", "matrícula"])
            .unwrap_or_default(),
    }
}

pub fn normalize_tutor(value: &Value) -> Option<TutorSummary> {
    let id = str_field(value, &["id", "tutorId"])?;
    Some(TutorSummary {
        id,
        name: str_field(value, &["name", "nombre"]).unwrap_or_else(|| "Tutor".into()),
        specialty: str_field(value, &["specialty", "especialidad"])
            .unwrap_or_else(|| "Apoyo".into()),
        rating: f64_field(value, &["rating", "promedio"]).unwrap_or(0.0),
        reviews_count: u32_field(value, &["reviewsCount", "num_reviews"]).unwrap_or(0),
        available: value
            .get("available")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        next_available: str_field(value, &["nextAvailable", "next_available"]),
        modalities: value
            .get("modalities")
            .or_else(|| value.get("modalidades"))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        price: f64_field(value, &["price", "tarifa"]),
    })
}

/// Pull the record list out of a response that is either a bare array or a
/// `{ "sessions": [...] }` wrapper.
pub fn unwrap_list(value: Value, key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

fn u32_field(value: &Value, keys: &[&str]) -> Option<u32> {
    for key in keys {
        match value.get(key) {
            Some(Value::Number(n)) => return n.as_u64().map(|n| n as u32),
            Some(Value::String(s)) => {
                if let Ok(n) = s.trim().parse::<u32>() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    None
}

fn f64_field(value: &Value, keys: &[&str]) -> Option<f64> {
    for key in keys {
        match value.get(key) {
            Some(Value::Number(n)) => return n.as_f64(),
            Some(Value::String(s)) => {
                if let Ok(n) = s.trim().parse::<f64>() {
                    return Some(n);
                }
            }
            _ => {}
        }
    }
    None
}

fn datetime_field(value: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    let raw = str_field(value, keys)?;
    DateTime::parse_from_rfc3339(&raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
