pub mod normalize;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::backend::{NotificationKind, RatingSubmission, SessionBackend, StatusUpdate};
use crate::core::config::ClientConfig;
use crate::core::error::ApiError;
use crate::core::session::{BookingRequest, Profile, Session, TutorSearch, TutorSummary};
use crate::core::status::SessionStatus;

use normalize::{normalize_profile, normalize_session, normalize_sessions, normalize_tutor, unwrap_list};

/// reqwest implementation of [`SessionBackend`] against the marketplace
/// REST API.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.request_timeout_secs,
            auth_token: None,
        })
    }

    /// Attach the bearer token from the stored identity blob.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_headers(&self, req: RequestBuilder) -> RequestBuilder {
        let req = req.header("Cache-Control", "no-cache");
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else {
            ApiError::Network(e.to_string())
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        let req = self.apply_headers(self.http.get(self.url(path)).query(query));
        let response = req.send().await.map_err(|e| self.map_transport_error(e))?;
        handle_response(response).await
    }

    async fn send_json<B: serde::Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<Value, ApiError> {
        let req = self.apply_headers(self.http.request(method, self.url(path)).json(body));
        let response = req.send().await.map_err(|e| self.map_transport_error(e))?;
        handle_response(response).await
    }
}

/// Non-2xx responses become `Http{status, message}` with the message pulled
/// from the JSON body when the backend provides one. Bodies that are not
/// JSON resolve to `Value::Null` rather than an error: several write
/// endpoints return an empty 200.
async fn handle_response(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            Err(_) => format!("HTTP {}", status.as_u16()),
        };
        return Err(ApiError::Http {
            status: status.as_u16(),
            message,
        });
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    Ok(response.json().await.unwrap_or(Value::Null))
}

fn search_query(search: &TutorSearch) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(area) = &search.area {
        query.push(("area", area.clone()));
    }
    if let Some(modality) = &search.modality {
        query.push(("modality", modality.clone()));
    }
    if let Some(day) = &search.day {
        query.push(("day", day.clone()));
    }
    if let Some(time) = &search.time {
        query.push(("time", time.clone()));
    }
    if let Some(duration) = &search.duration {
        query.push(("duration", duration.clone()));
    }
    query
}

#[async_trait]
impl SessionBackend for HttpBackend {
    async fn fetch_profile(&self, email: &str) -> Result<Profile, ApiError> {
        // Primary endpoint, then the older /users/profile variant.
        match self.get_json("/auth/profile", &[("email", email)]).await {
            Ok(body) => {
                let record = body.get("profile").unwrap_or(&body);
                Ok(normalize_profile(record, email))
            }
            Err(e) => {
                warn!("profile fetch via /auth/profile failed, trying /users/profile: {e}");
                let body = self.get_json("/users/profile", &[("email", email)]).await?;
                let record = body.get("profile").unwrap_or(&body);
                Ok(normalize_profile(record, email))
            }
        }
    }

    async fn fetch_student_sessions(&self, email: &str) -> Result<Vec<Session>, ApiError> {
        // Primary endpoint, then the flat /sessions?email= variant.
        let body = match self
            .get_json("/students/sessions", &[("email", email)])
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!("session fetch via /students/sessions failed, trying /sessions: {e}");
                self.get_json("/sessions", &[("email", email)]).await?
            }
        };
        Ok(normalize_sessions(&unwrap_list(body, "sessions")))
    }

    async fn fetch_tutor_sessions(&self, tutor_id: &str) -> Result<Vec<Session>, ApiError> {
        let path = format!("/tutors/{tutor_id}/sessions");
        let body = self.get_json(&path, &[]).await?;
        Ok(normalize_sessions(&unwrap_list(body, "sessions")))
    }

    async fn create_session(&self, booking: &BookingRequest) -> Result<Session, ApiError> {
        let body = self
            .send_json(reqwest::Method::POST, "/sessions", booking)
            .await?;

        // Some backend revisions return the full record, others just the id.
        if let Ok(session) = normalize_session(&body) {
            return Ok(session);
        }
        let id = body
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| body.get("id").and_then(Value::as_u64).map(|n| n.to_string()))
            .ok_or_else(|| ApiError::Decode("create response without id".into()))?;
        debug!("create response had no full record, building session {id} from booking");
        Ok(session_from_booking(id, booking))
    }

    async fn update_session_status(&self, update: &StatusUpdate) -> Result<(), ApiError> {
        let path = format!("/sessions/{}/status", update.session_id);
        self.send_json(reqwest::Method::PUT, &path, update).await?;
        Ok(())
    }

    async fn create_rating(&self, rating: &RatingSubmission) -> Result<(), ApiError> {
        self.send_json(reqwest::Method::POST, "/ratings", rating)
            .await?;
        Ok(())
    }

    async fn search_tutors(&self, search: &TutorSearch) -> Result<Vec<TutorSummary>, ApiError> {
        let query = search_query(search);
        let query_refs: Vec<(&str, &str)> =
            query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let body = self.get_json("/tutors", &query_refs).await?;
        Ok(unwrap_list(body, "tutors")
            .iter()
            .filter_map(normalize_tutor)
            .collect())
    }

    async fn notify(&self, kind: NotificationKind, payload: Value) -> Result<(), ApiError> {
        self.send_json(reqwest::Method::POST, kind.path(), &payload)
            .await?;
        Ok(())
    }
}

/// Fill a Session from the booking the student just submitted plus the id
/// the backend assigned. New sessions always start pending.
fn session_from_booking(id: String, booking: &BookingRequest) -> Session {
    let now = chrono::Utc::now();
    Session {
        id,
        student_id: booking.student_id.clone(),
        student_name: booking.student_name.clone(),
        tutor_id: booking.tutor_id.clone(),
        tutor_name: booking.tutor_name.clone(),
        subject: booking.subject.clone(),
        title: None,
        date: booking.date.clone(),
        time: booking.time.clone(),
        duration_minutes: booking.duration_minutes,
        modality: booking.modality,
        location: booking.location.clone(),
        link: None,
        objective: booking.objective.clone(),
        comments: booking.comments.clone(),
        status: SessionStatus::Pending,
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
