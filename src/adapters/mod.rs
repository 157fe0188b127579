pub mod student;
pub mod tutor;

pub use student::{ProfileView, StudentView, UpcomingSession};
pub use tutor::{Bucket, TutorView};


use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::core::backend::{NotificationKind, SessionBackend, StatusUpdate};
use crate::core::error::TutoriaError;
use crate::core::session::{Role, Session};
use crate::core::status::SessionStatus;
use crate::sync::SyncBridge;

/// Session list plus the side channel distinguishing "no sessions" from
/// "fetch failed": when `fetch_failed` is set the list came from the local
/// cache (or is empty) and must not be presented as fresh.
#[derive(Debug, Clone, Default)]
pub struct SessionsView {
    pub sessions: Vec<Session>,
    pub fetch_failed: bool,
}

/// Shared commit path for a locally performed transition.
///
/// Order matters: the backend confirms first; only then are the cache and
/// the bridge touched. The status-change notification to the other party is
/// fire-and-forget; its failure never rolls back the transition.
pub(crate) async fn commit_status_change(
    backend: &Arc<dyn SessionBackend>,
    bridge: &Arc<SyncBridge>,
    updated: Session,
    previous_status: SessionStatus,
    actor: Role,
) -> Result<Session, TutoriaError> {
    let actor_id = match actor {
        Role::Student => updated.student_id.clone(),
        Role::Tutor => updated.tutor_id.clone(),
    };
    let update = StatusUpdate {
        session_id: updated.id.clone(),
        status: updated.status,
        user_id: actor_id.clone(),
        user_type: actor,
        timestamp: updated.updated_at,
    };
    backend.update_session_status(&update).await?;

    if let Err(e) = bridge.publish_local_change(&updated, previous_status).await {
        // the backend already accepted the change; a cache failure is not a
        // failed transition
        warn!("transition committed but local cache write failed: {e}");
    }

    let payload = json!({
        "sessionId": updated.id,
        "status": updated.status,
        "userId": actor_id,
        "userType": actor,
    });
    if let Err(e) = backend
        .notify(NotificationKind::SessionStatusChange, payload)
        .await
    {
        warn!("status-change notification failed: {e}");
    }

    Ok(updated)
}
