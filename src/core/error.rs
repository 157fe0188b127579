use thiserror::Error;

use crate::core::session::Role;
use crate::core::status::SessionStatus;

#[derive(Error, Debug)]
pub enum TutoriaError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Transition {from} -> {to} is not permitted")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Role '{role}' may not request {from} -> {to}")]
    UnauthorizedActor {
        role: Role,
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Unknown session status: '{0}'")]
    UnknownStatus(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Proposed date/time is in the past")]
    PastDate,

    #[error("Less than {required_hours}h of notice before the proposed time")]
    InsufficientNotice { required_hours: u32 },

    #[error("Tutor already has {limit} sessions scheduled that day")]
    DailyLimitExceeded { limit: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(u8),

    #[error("Session is not completed; current status: {0}")]
    NotRatable(SessionStatus),

    #[error("Attendance can only be recorded for accepted sessions; current status: {0}")]
    NotCompletable(SessionStatus),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
