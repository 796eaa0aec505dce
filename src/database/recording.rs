//! Store double for tests: delegates to an in-memory `SqliteStore`, logs every
//! call by operation name and can be told to fail specific operations.

use super::db::SqliteStore;
use super::gateway::RemoteStore;
use crate::errors::StoreError;
use crate::models::{Clock, Flashcard, FlashcardId, Identity, ScoreRecord, Topic, TopicId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct RecordingStore {
    inner: SqliteStore,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, StoreError>>,
}

impl RecordingStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: SqliteStore::open_in_memory_with_clock(clock).unwrap(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &SqliteStore {
        &self.inner
    }

    pub fn fail(&self, operation: &'static str, error: StoreError) {
        self.failures.lock().unwrap().insert(operation, error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split('(').next() == Some(operation))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn enter(&self, call: String) -> Result<(), StoreError> {
        let operation = call.split('(').next().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(operation.as_str()) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn list_topics(&self, caller: Option<&Identity>) -> Result<Vec<Topic>, StoreError> {
        self.enter("list_topics()".to_string())?;
        self.inner.list_topics(caller).await
    }

    async fn create_topic(
        &self,
        caller: Option<&Identity>,
        name: &str,
        initial_next_review: DateTime<Utc>,
    ) -> Result<Topic, StoreError> {
        self.enter(format!("create_topic({})", name))?;
        self.inner
            .create_topic(caller, name, initial_next_review)
            .await
    }

    async fn delete_topic(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<bool, StoreError> {
        self.enter(format!("delete_topic({})", topic_id))?;
        self.inner.delete_topic(caller, topic_id).await
    }

    async fn set_topic_next_review(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        next_review: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.enter(format!(
            "set_topic_next_review({}, {})",
            topic_id,
            next_review.to_rfc3339()
        ))?;
        self.inner
            .set_topic_next_review(caller, topic_id, next_review)
            .await
    }

    async fn list_flashcards(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<Vec<Flashcard>, StoreError> {
        self.enter(format!("list_flashcards({})", topic_id))?;
        self.inner.list_flashcards(caller, topic_id).await
    }

    async fn create_flashcard(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        front: &str,
        back: &str,
    ) -> Result<Flashcard, StoreError> {
        self.enter(format!("create_flashcard({}, {})", topic_id, front))?;
        self.inner
            .create_flashcard(caller, topic_id, front, back)
            .await
    }

    async fn update_flashcard(
        &self,
        caller: Option<&Identity>,
        card_id: FlashcardId,
        front: &str,
        back: &str,
    ) -> Result<bool, StoreError> {
        self.enter(format!("update_flashcard({})", card_id))?;
        self.inner.update_flashcard(caller, card_id, front, back).await
    }

    async fn delete_flashcard(
        &self,
        caller: Option<&Identity>,
        card_id: FlashcardId,
    ) -> Result<bool, StoreError> {
        self.enter(format!("delete_flashcard({})", card_id))?;
        self.inner.delete_flashcard(caller, card_id).await
    }

    async fn list_score_history(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<Vec<ScoreRecord>, StoreError> {
        self.enter(format!("list_score_history({})", topic_id))?;
        self.inner.list_score_history(caller, topic_id).await
    }

    async fn record_score(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        correct_count: u32,
        incorrect_count: u32,
    ) -> Result<ScoreRecord, StoreError> {
        self.enter(format!(
            "record_score({}, {}, {})",
            topic_id, correct_count, incorrect_count
        ))?;
        self.inner
            .record_score(caller, topic_id, correct_count, incorrect_count)
            .await
    }
}
