use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

use crate::core::error::StorageError;
use crate::core::session::Session;
use crate::core::status::SessionStatus;
use crate::storage::Database;

/// Change notifications other open views subscribe to. Stands in for the
/// browser storage-change event: same-process only, best-effort delivery.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    SessionChanged {
        session: Session,
        previous_status: Option<SessionStatus>,
    },
    /// Student asked to reschedule. Extension point: no transition is
    /// defined for this yet, the intent is only surfaced.
    RescheduleRequested { session_id: String },
}

/// Propagates status changes between the student and tutor views.
///
/// Two triggers feed it: local transitions committed by an adapter, and
/// remote deltas detected by the poller. Both funnel into the same
/// compare-and-set cache write, so firing redundantly is safe.
pub struct SyncBridge {
    db: Database,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncBridge {
    pub fn new(db: Database) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { db, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// The same events as a `Stream`, for views that render from an event
    /// loop.
    pub fn event_stream(&self) -> BroadcastStream<SyncEvent> {
        BroadcastStream::new(self.events.subscribe())
    }

    /// Commit a locally performed transition: cache write + change event.
    /// Called only after the backend confirmed the update.
    pub async fn publish_local_change(
        &self,
        session: &Session,
        previous_status: SessionStatus,
    ) -> Result<(), StorageError> {
        self.db.sessions().upsert_if_newer(session).await?;
        self.emit(SyncEvent::SessionChanged {
            session: session.clone(),
            previous_status: Some(previous_status),
        });
        Ok(())
    }

    /// Apply a session fetched from the backend. The updated-at
    /// compare-and-set drops stale copies; an event fires only when the
    /// write applied and the status actually changed.
    pub async fn apply_remote_session_update(
        &self,
        session: Session,
    ) -> Result<bool, StorageError> {
        let previous = self
            .db
            .sessions()
            .cached_status(&session.id)
            .await?
            .map(|(status, _)| status);

        let applied = self.db.sessions().upsert_if_newer(&session).await?;
        if applied && previous != Some(session.status) {
            debug!(
                session_id = %session.id,
                from = ?previous,
                to = %session.status,
                "remote status change applied"
            );
            self.emit(SyncEvent::SessionChanged {
                session,
                previous_status: previous,
            });
        }
        Ok(applied)
    }

    pub fn request_reschedule(&self, session_id: &str) {
        self.emit(SyncEvent::RescheduleRequested {
            session_id: session_id.to_string(),
        });
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is not an error: delivery is best-effort.
        let _ = self.events.send(event);
    }
}
