use chrono::{Duration, Utc};

use crate::core::config::ClientConfig;
use crate::core::session::{Modality, Profile, Session};
use crate::core::status::SessionStatus;
use crate::storage::{Database, Identity};

async fn test_db() -> (Database, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        working_dir: tmp.path().to_path_buf(),
        data_dir: "data".into(),
        ..Default::default()
    };
    let db = Database::open(&config).await.unwrap();
    db.run_migrations().await.unwrap();
    (db, tmp)
}

fn cached_session(id: &str, status: SessionStatus) -> Session {
    let now = Utc::now();
    Session {
        id: id.into(),
        student_id: "al-1".into(),
        student_name: None,
        tutor_id: "tu-1".into(),
        tutor_name: Some("Dr. Carlos López".into()),
        subject: "Matemáticas".into(),
        title: None,
        date: "2025-10-05".into(),
        time: "10:00".into(),
        duration_minutes: Some(60),
        modality: Some(Modality::Presencial),
        location: Some("Biblioteca".into()),
        link: None,
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

#[tokio::test]
async fn test_session_cache_roundtrip() {
    let (db, _tmp) = test_db().await;

    let session = cached_session("s-1", SessionStatus::Pending);
    assert!(db.sessions().upsert_if_newer(&session).await.unwrap());

    let fetched = db.sessions().get("s-1").await.unwrap();
    assert_eq!(fetched, session);

    let for_student = db.sessions().list_for_student("al-1").await.unwrap();
    assert_eq!(for_student.len(), 1);
    let for_tutor = db.sessions().list_for_tutor("tu-1").await.unwrap();
    assert_eq!(for_tutor.len(), 1);
    assert!(db.sessions().list_for_tutor("tu-99").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_session() {
    let (db, _tmp) = test_db().await;
    assert!(db.sessions().get("nope").await.is_err());
}

#[tokio::test]
async fn test_upsert_compare_and_set() {
    let (db, _tmp) = test_db().await;

    let mut session = cached_session("s-1", SessionStatus::Pending);
    db.sessions().upsert_if_newer(&session).await.unwrap();

    // a response older than the cache loses
    let mut stale = session.clone();
    stale.status = SessionStatus::Rejected;
    stale.updated_at = session.updated_at - Duration::seconds(30);
    assert!(!db.sessions().upsert_if_newer(&stale).await.unwrap());
    assert_eq!(
        db.sessions().get("s-1").await.unwrap().status,
        SessionStatus::Pending
    );

    // an equal timestamp is also a no-op: redundant triggers are safe
    assert!(!db.sessions().upsert_if_newer(&session).await.unwrap());

    // a newer response wins and replaces the whole record
    session.status = SessionStatus::Accepted;
    session.updated_at = session.updated_at + Duration::seconds(30);
    assert!(db.sessions().upsert_if_newer(&session).await.unwrap());
    let fetched = db.sessions().get("s-1").await.unwrap();
    assert_eq!(fetched.status, SessionStatus::Accepted);
}

#[tokio::test]
async fn test_count_for_tutor_on_date() {
    let (db, _tmp) = test_db().await;

    for i in 0..3 {
        let mut s = cached_session(&format!("s-{i}"), SessionStatus::Accepted);
        s.date = "2025-10-05".into();
        db.sessions().upsert_if_newer(&s).await.unwrap();
    }
    let mut other_day = cached_session("s-other", SessionStatus::Accepted);
    other_day.date = "2025-10-06".into();
    db.sessions().upsert_if_newer(&other_day).await.unwrap();
    let mut pending = cached_session("s-pending", SessionStatus::Pending);
    pending.date = "2025-10-05".into();
    db.sessions().upsert_if_newer(&pending).await.unwrap();

    let count = db
        .sessions()
        .count_for_tutor_on("tu-1", "2025-10-05", SessionStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_cached_status_lookup() {
    let (db, _tmp) = test_db().await;

    assert!(db.sessions().cached_status("s-1").await.unwrap().is_none());

    let session = cached_session("s-1", SessionStatus::Postponed);
    db.sessions().upsert_if_newer(&session).await.unwrap();

    let (status, updated_at) = db.sessions().cached_status("s-1").await.unwrap().unwrap();
    assert_eq!(status, SessionStatus::Postponed);
    // rfc3339 round-trip keeps ordering
    assert!((updated_at - session.updated_at).num_seconds().abs() < 1);
}

#[tokio::test]
async fn test_identity_blob_roundtrip() {
    let (db, _tmp) = test_db().await;

    assert!(db.identity().load_identity().await.unwrap().is_none());

    let identity = Identity {
        email: "jair.serralta@estudiante.edu".into(),
        full_name: Some("Jair Serralta".into()),
        auth_token: Some("tok-123".into()),
    };
    db.identity().save_identity(&identity).await.unwrap();
    assert_eq!(db.identity().load_identity().await.unwrap(), Some(identity));

    db.identity().clear_identity().await.unwrap();
    assert!(db.identity().load_identity().await.unwrap().is_none());
}

#[tokio::test]
async fn test_profile_fallback_cache() {
    let (db, _tmp) = test_db().await;

    let profile = Profile {
        first_name: "Jair".into(),
        last_name: "Serralta".into(),
        email: "jair.serralta@estudiante.edu".into(),
        student_id: "2024001234".into(),
    };
    db.identity().save_profile(&profile).await.unwrap();

    let (cached, stored_at) = db.identity().load_profile().await.unwrap().unwrap();
    assert_eq!(cached, profile);
    assert!((Utc::now() - stored_at).num_seconds() < 5);
}
