use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::core::error::StorageError;
use crate::core::session::Session;
use crate::core::status::SessionStatus;

/// Local mirror of the session list, one full record per session id.
///
/// Sessions are never deleted here: rejection and cancellation are terminal
/// statuses, not removals. Writes replace the whole record and are guarded
/// by an updated-at compare-and-set so a stale response can never clobber a
/// newer one.
pub struct SessionCache {
    pool: SqlitePool,
}

impl SessionCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write `session` unless the cached copy is already as new. Returns
    /// whether the write applied.
    pub async fn upsert_if_newer(&self, session: &Session) -> Result<bool, StorageError> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT updated_at FROM sessions WHERE id = ?")
                .bind(&session.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?;

        if let Some((updated_at,)) = existing {
            let cached = parse_timestamp(&updated_at)?;
            if cached >= session.updated_at {
                return Ok(false);
            }
        }

        let payload = serde_json::to_string(session)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        sqlx::query(
            "INSERT OR REPLACE INTO sessions \
             (id, status, student_id, tutor_id, date, updated_at, payload) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.status.as_str())
        .bind(&session.student_id)
        .bind(&session.tutor_id)
        .bind(&session.date)
        .bind(session.updated_at.to_rfc3339())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(true)
    }

    pub async fn get(&self, id: &str) -> Result<Session, StorageError> {
        let row: (String,) = sqlx::query_as("SELECT payload FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?
            .ok_or_else(|| StorageError::NotFound(format!("session {id}")))?;

        row_to_session(row.0)
    }

    pub async fn list_for_student(&self, student_id: &str) -> Result<Vec<Session>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT payload FROM sessions WHERE student_id = ? ORDER BY date, updated_at",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

        rows.into_iter().map(|(p,)| row_to_session(p)).collect()
    }

    pub async fn list_for_tutor(&self, tutor_id: &str) -> Result<Vec<Session>, StorageError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT payload FROM sessions WHERE tutor_id = ? ORDER BY date")
                .bind(tutor_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?;

        rows.into_iter().map(|(p,)| row_to_session(p)).collect()
    }

    /// How many sessions the tutor holds in `status` on `date`. Drives the
    /// per-tutor daily cap.
    pub async fn count_for_tutor_on(
        &self,
        tutor_id: &str,
        date: &str,
        status: SessionStatus,
    ) -> Result<u32, StorageError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sessions WHERE tutor_id = ? AND date = ? AND status = ?",
        )
        .bind(tutor_id)
        .bind(date)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(row.0 as u32)
    }

    /// Cached timestamp for a session, if present. The poller uses this to
    /// detect deltas without deserializing every record.
    pub async fn cached_status(
        &self,
        id: &str,
    ) -> Result<Option<(SessionStatus, DateTime<Utc>)>, StorageError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT status, updated_at FROM sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::Database(e.to_string()))?;

        match row {
            Some((status, updated_at)) => {
                let status = SessionStatus::parse(&status)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some((status, parse_timestamp(&updated_at)?)))
            }
            None => Ok(None),
        }
    }
}

fn row_to_session(payload: String) -> Result<Session, StorageError> {
    serde_json::from_str(&payload).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}
