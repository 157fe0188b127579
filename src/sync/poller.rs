use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::backend::SessionBackend;
use crate::core::config::ClientConfig;
use crate::sync::SyncBridge;

/// Whose session list a poller re-fetches.
#[derive(Debug, Clone)]
pub enum PollTarget {
    Student { email: String },
    Tutor { tutor_id: String },
}

/// Fixed-interval re-fetch of a session list, diffed against the cache via
/// the bridge. No backoff: a failed poll logs a warning, keeps the cached
/// data and waits for the next tick.
pub struct SessionPoller {
    backend: Arc<dyn SessionBackend>,
    bridge: Arc<SyncBridge>,
    target: PollTarget,
    period: Duration,
}

impl SessionPoller {
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        bridge: Arc<SyncBridge>,
        target: PollTarget,
        period: Duration,
    ) -> Self {
        Self {
            backend,
            bridge,
            target,
            period,
        }
    }

    pub fn for_student(
        backend: Arc<dyn SessionBackend>,
        bridge: Arc<SyncBridge>,
        email: impl Into<String>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(
            backend,
            bridge,
            PollTarget::Student {
                email: email.into(),
            },
            Duration::from_secs(config.sync.student_poll_secs),
        )
    }

    pub fn for_tutor(
        backend: Arc<dyn SessionBackend>,
        bridge: Arc<SyncBridge>,
        tutor_id: impl Into<String>,
        config: &ClientConfig,
    ) -> Self {
        Self::new(
            backend,
            bridge,
            PollTarget::Tutor {
                tutor_id: tutor_id.into(),
            },
            Duration::from_secs(config.sync.tutor_poll_secs),
        )
    }

    /// Spawn the polling loop. Cancel the returned token to stop it.
    pub fn spawn(self) -> (JoinHandle<()>, CancellationToken) {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            // the first tick is immediate; consume it so polls start one
            // period after spawn, like the original timers
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        debug!("session poller stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }
        });

        (handle, cancel)
    }

    /// One poll cycle. Public so tests (and manual refresh buttons) can
    /// drive it without waiting out the interval.
    pub async fn tick(&self) {
        let fetched = match &self.target {
            PollTarget::Student { email } => self.backend.fetch_student_sessions(email).await,
            PollTarget::Tutor { tutor_id } => self.backend.fetch_tutor_sessions(tutor_id).await,
        };

        let sessions = match fetched {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("session poll failed, keeping cached data: {e}");
                return;
            }
        };

        for session in sessions {
            if let Err(e) = self.bridge.apply_remote_session_update(session).await {
                warn!("failed to apply polled session update: {e}");
            }
        }
    }
}
