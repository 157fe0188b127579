//! Client-side coordination layer for a tutoring-session marketplace.
//!
//! Owns the session-status state machine shared by the student and tutor
//! dashboards, the adapters that talk to the backend REST API, a local
//! SQLite mirror of the session caches, and the polling/event bridge that
//! keeps both views in sync without a push channel.

pub mod adapters;
pub mod api;
pub mod core;
pub mod storage;
pub mod sync;

pub use crate::adapters::{
    Bucket, ProfileView, SessionsView, StudentView, TutorView, UpcomingSession,
};
pub use crate::api::HttpBackend;
pub use crate::core::backend::{NotificationKind, RatingSubmission, SessionBackend, StatusUpdate};
pub use crate::core::config::{load_config, ClientConfig};
pub use crate::core::error::{
    ApiError, ScheduleError, TransitionError, TutoriaError, ValidationError,
};
pub use crate::core::session::{
    BookingRequest, Modality, Profile, Role, Session, TutorSearch, TutorSummary,
};
pub use crate::core::status::SessionStatus;
pub use crate::storage::{Database, Identity, IdentityStore, SessionCache};
pub use crate::sync::{PollTarget, SessionPoller, SyncBridge, SyncEvent};
