//! Error types shared by the store boundary and the practice core.

use thiserror::Error;

/// Failures reported by a `RemoteStore`.
///
/// `NotFound` deliberately covers both "does not exist" and "owned by someone
/// else" so callers cannot probe for other users' topics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("you must sign in first")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Transient(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        StoreError::Transient(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("this topic has no flashcards to practice")]
    EmptyTopic,
    #[error("a practice session is already running")]
    PracticeActive,
    #[error("no practice session is running")]
    NoActivePractice,
    #[error("reveal the answer before grading it")]
    AnswerHidden,
    #[error("the reminder must be set to a time in the future")]
    ReminderNotInFuture,
    #[error("select a topic first")]
    NoTopicSelected,
    #[error("import failed: {0}")]
    Import(String),
    #[error("export failed: {0}")]
    Export(String),
}

impl AppError {
    /// True when the failure came from the caller not being signed in.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Store(StoreError::Unauthorized))
    }
}
