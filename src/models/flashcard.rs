//! Flashcard is a pair <front, back> belonging to exactly one topic
use super::{FlashcardId, TopicId};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flashcard {
    pub id: FlashcardId,
    pub topic_id: TopicId,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
}
