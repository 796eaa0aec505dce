pub mod clock;
pub mod flashcard;
pub mod practice_session;
pub mod scheduler;
pub mod score;
pub mod topic;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use clock::{Clock, ManualClock, SystemClock};
pub use flashcard::Flashcard;
pub use practice_session::{
    AnswerOutcome, PracticeEngine, PracticeSession, SessionResult, SessionView,
};
pub use score::ScoreRecord;
pub use topic::Topic;

pub type TopicId = i64;
pub type FlashcardId = i64;
pub type ScoreId = i64;

/// Stable identifier of the signed-in caller, as supplied by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(principal: impl Into<String>) -> Self {
        Self(principal.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
