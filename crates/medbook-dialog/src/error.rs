//! Error types for the dialog engine.

use medbook_core::error::MedbookError;

/// Hard failures of a turn. Conversational dead ends (unparsed dates,
/// past-dated bookings, unclassified utterances) are answers, not errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("classifier unavailable: {0}")]
    Classifier(String),
    #[error("malformed entity: {0}")]
    MalformedEntity(String),
    #[error("delivery failed: {0}")]
    Transport(String),
    #[error("booking backend error: {0}")]
    Backend(String),
    #[error("session is busy with a turn: {0}")]
    SessionBusy(String),
    #[error("session lock poisoned: {0}")]
    SessionLock(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<MedbookError> for DialogError {
    fn from(err: MedbookError) -> Self {
        DialogError::Config(err.to_string())
    }
}

/// Reasons a piece of text could not be turned into a date or time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemporalError {
    #[error("empty temporal expression")]
    Empty,
    #[error("unrecognized temporal expression: {0}")]
    Unrecognized(String),
    #[error("invalid calendar date: {0}")]
    InvalidDate(String),
    #[error("invalid time of day: {0}")]
    InvalidTime(String),
    #[error("temporal value out of range")]
    OutOfRange,
}
