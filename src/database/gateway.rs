//! Contract to the authoritative, per-identity data store.
//!
//! The practice core never touches storage directly. Every call may fail for
//! network or authorization reasons and nothing here retries automatically.
//! A `None` caller is rejected with `StoreError::Unauthorized`.

use crate::errors::StoreError;
use crate::models::{Flashcard, FlashcardId, Identity, ScoreRecord, Topic, TopicId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    // Topics
    async fn list_topics(&self, caller: Option<&Identity>) -> Result<Vec<Topic>, StoreError>;
    async fn create_topic(
        &self,
        caller: Option<&Identity>,
        name: &str,
        initial_next_review: DateTime<Utc>,
    ) -> Result<Topic, StoreError>;
    /// Cascades to the topic's flashcards and scores. `false` if absent or not owned.
    async fn delete_topic(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<bool, StoreError>;
    async fn set_topic_next_review(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        next_review: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    // Flashcards
    async fn list_flashcards(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<Vec<Flashcard>, StoreError>;
    async fn create_flashcard(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        front: &str,
        back: &str,
    ) -> Result<Flashcard, StoreError>;
    async fn update_flashcard(
        &self,
        caller: Option<&Identity>,
        card_id: FlashcardId,
        front: &str,
        back: &str,
    ) -> Result<bool, StoreError>;
    async fn delete_flashcard(
        &self,
        caller: Option<&Identity>,
        card_id: FlashcardId,
    ) -> Result<bool, StoreError>;

    // Scores
    async fn list_score_history(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<Vec<ScoreRecord>, StoreError>;
    async fn record_score(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        correct_count: u32,
        incorrect_count: u32,
    ) -> Result<ScoreRecord, StoreError>;
}

/// Resolves the caller or fails the way every store operation must when signed out.
pub fn require_identity(caller: Option<&Identity>) -> Result<&Identity, StoreError> {
    caller.ok_or(StoreError::Unauthorized)
}
