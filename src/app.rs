//! Application state and the operations a presentation layer drives.
//!
//! `App` is the single owner of the cache and the practice engine. Every
//! operation takes `&mut self` and awaits the store before returning, so
//! refreshes of the same list can never overlap. Readers get a cloned
//! `AppSnapshot`.

use crate::cache::TopicCache;
use crate::database::RemoteStore;
use crate::errors::{AppError, StoreError};
use crate::export::json::{export_topic_to_path, import_topic};
use crate::models::scheduler::validate_manual_reminder;
use crate::models::{
    AnswerOutcome, Clock, Flashcard, FlashcardId, Identity, PracticeEngine, PracticeSession,
    ScoreRecord, SessionView, Topic, TopicId,
};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

/// Result of asking to switch topics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    Selected,
    /// A practice session for another topic is running and the caller chose to keep it.
    Declined,
}

/// Everything a display layer needs, detached from the live state.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub identity: Option<Identity>,
    pub topics: Vec<Topic>,
    pub selected: Option<Topic>,
    pub flashcards: Vec<Flashcard>,
    pub scores: Vec<ScoreRecord>,
    pub session: Option<SessionView>,
    pub last_result: Option<String>,
    pub last_error: Option<String>,
}

pub struct App<S: RemoteStore> {
    store: S,
    clock: Arc<dyn Clock>,
    identity: Option<Identity>,
    cache: TopicCache,
    engine: PracticeEngine,
    last_error: Option<String>,
}

impl<S: RemoteStore> App<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            identity: None,
            cache: TopicCache::new(),
            engine: PracticeEngine::new(),
            last_error: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn cache(&self) -> &TopicCache {
        &self.cache
    }

    pub fn engine(&self) -> &PracticeEngine {
        &self.engine
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn report(&mut self, err: &dyn std::fmt::Display) {
        self.last_error = Some(err.to_string());
    }

    fn fail<T>(&mut self, err: impl Into<AppError>) -> Result<T, AppError> {
        let err = err.into();
        self.report(&err);
        Err(err)
    }

    /// Called by the identity boundary on sign-in (`Some`) and sign-out (`None`).
    pub async fn on_auth_change(&mut self, identity: Option<Identity>) {
        match identity {
            None => {
                tracing::info!("Signed out, clearing cached data");
                self.identity = None;
                self.cache.clear();
                self.engine.reset();
                self.last_error = None;
            }
            Some(identity) => {
                if self.identity.as_ref() != Some(&identity) {
                    self.cache.clear();
                    self.engine.reset();
                }
                tracing::info!("Signed in as {}", identity);
                self.identity = Some(identity);
                self.last_error = None;
                self.refresh_topics().await;
            }
        }
    }

    /// Reloads the topic list. Failures end up in `last_error` with an empty list.
    pub async fn refresh_topics(&mut self) {
        if let Err(e) = self
            .cache
            .load_topics(&self.store, self.identity.as_ref())
            .await
        {
            self.report(&e);
        }
    }

    /// Switches the selected topic.
    ///
    /// When a practice session for a different topic is running, `confirm_exit`
    /// decides whether to abandon it. Declining leaves everything unchanged.
    pub async fn select_topic(
        &mut self,
        topic_id: TopicId,
        confirm_exit: impl FnOnce(&PracticeSession) -> bool,
    ) -> Result<Selection, AppError> {
        let Some(topic) = self.cache.find_topic(topic_id).cloned() else {
            return self.fail(StoreError::NotFound);
        };

        if let Some(session) = self.engine.session() {
            if session.topic_id != topic_id {
                if !confirm_exit(session) {
                    return Ok(Selection::Declined);
                }
                self.engine.exit();
            }
        }

        if let Err(e) = self
            .cache
            .select_topic(&self.store, self.identity.as_ref(), topic)
            .await
        {
            return self.fail(e);
        }
        Ok(Selection::Selected)
    }

    fn selected_topic(&self) -> Result<Topic, AppError> {
        self.cache.selected().cloned().ok_or(AppError::NoTopicSelected)
    }

    /// Creates a topic that is due right away.
    pub async fn create_topic(&mut self, name: &str) -> Result<Topic, AppError> {
        let now = self.clock.now();
        let topic = match self
            .store
            .create_topic(self.identity.as_ref(), name, now)
            .await
        {
            Ok(topic) => topic,
            Err(e) => return self.fail(e),
        };
        tracing::info!("Topic '{}' created", topic.name);
        self.refresh_topics().await;
        Ok(topic)
    }

    pub async fn delete_topic(&mut self, topic_id: TopicId) -> Result<(), AppError> {
        match self
            .store
            .delete_topic(self.identity.as_ref(), topic_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.fail(StoreError::NotFound),
            Err(e) => return self.fail(e),
        }
        if self.engine.session().is_some_and(|s| s.topic_id == topic_id) {
            self.engine.exit();
        }
        tracing::info!("Topic {} deleted", topic_id);
        self.refresh_topics().await;
        Ok(())
    }

    async fn refresh_flashcards(&mut self, topic_id: TopicId) -> Result<(), AppError> {
        if let Err(e) = self
            .cache
            .load_flashcards(&self.store, self.identity.as_ref(), topic_id)
            .await
        {
            return self.fail(e);
        }
        Ok(())
    }

    /// Adds a card to the selected topic.
    pub async fn add_flashcard(&mut self, front: &str, back: &str) -> Result<Flashcard, AppError> {
        let topic = self.selected_topic()?;
        let card = match self
            .store
            .create_flashcard(self.identity.as_ref(), topic.id, front, back)
            .await
        {
            Ok(card) => card,
            Err(e) => return self.fail(e),
        };
        self.refresh_flashcards(topic.id).await?;
        Ok(card)
    }

    pub async fn edit_flashcard(
        &mut self,
        card_id: FlashcardId,
        front: &str,
        back: &str,
    ) -> Result<(), AppError> {
        let topic = self.selected_topic()?;
        match self
            .store
            .update_flashcard(self.identity.as_ref(), card_id, front, back)
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.fail(StoreError::NotFound),
            Err(e) => return self.fail(e),
        }
        self.refresh_flashcards(topic.id).await
    }

    pub async fn remove_flashcard(&mut self, card_id: FlashcardId) -> Result<(), AppError> {
        let topic = self.selected_topic()?;
        match self
            .store
            .delete_flashcard(self.identity.as_ref(), card_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.fail(StoreError::NotFound),
            Err(e) => return self.fail(e),
        }
        self.refresh_flashcards(topic.id).await
    }

    /// Starts practicing the selected topic's cards as currently cached.
    pub fn start_practice(&mut self) -> Result<(), AppError> {
        let topic = self.selected_topic()?;
        let result = self.engine.start(&topic, self.cache.flashcards());
        if let Err(e) = result {
            return self.fail(e);
        }
        Ok(())
    }

    pub fn reveal_answer(&mut self) -> bool {
        self.engine.reveal()
    }

    /// Grades the current card. Finishing the session also refreshes the
    /// topic list and score history so the new schedule and score show up.
    pub async fn answer(&mut self, is_correct: bool) -> Result<AnswerOutcome, AppError> {
        let now = self.clock.now();
        let outcome = match self
            .engine
            .answer(&self.store, self.identity.as_ref(), is_correct, now)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(e),
        };

        if let AnswerOutcome::Completed(result) = &outcome {
            if let Some(e) = result.errors.first() {
                self.last_error = Some(format!("Could not save practice result: {}", e));
            } else {
                self.refresh_topics().await;
                if let Err(e) = self
                    .cache
                    .load_score_history(&self.store, self.identity.as_ref(), result.topic_id)
                    .await
                {
                    self.report(&e);
                }
            }
        }
        Ok(outcome)
    }

    /// Abandons the running session. Nothing is recorded.
    pub fn exit_practice(&mut self) -> bool {
        self.engine.exit()
    }

    /// Sets the selected topic's next review by hand.
    ///
    /// Targets that are not strictly in the future are refused before the store is called.
    pub async fn set_manual_reminder(&mut self, target: DateTime<Utc>) -> Result<(), AppError> {
        let topic = self.selected_topic()?;
        let target = match validate_manual_reminder(target, self.clock.now()) {
            Ok(target) => target,
            Err(e) => return self.fail(e),
        };
        match self
            .store
            .set_topic_next_review(self.identity.as_ref(), topic.id, target)
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.fail(StoreError::NotFound),
            Err(e) => return self.fail(e),
        }
        tracing::info!("Reminder for '{}' set to {}", topic.name, target);
        self.refresh_topics().await;
        Ok(())
    }

    /// Exports the selected topic with its cached flashcards.
    pub fn export_selected_topic(&mut self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let topic = self.selected_topic()?;
        let exported = export_topic_to_path(&topic, self.cache.flashcards(), path)
            .map_err(|e| AppError::Export(e.to_string()));
        match exported {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    /// Creates a new topic from an exported JSON file.
    pub async fn import_topic(&mut self, path: impl AsRef<Path>) -> Result<Topic, AppError> {
        let parsed = import_topic(path).map_err(|e| AppError::Import(e.to_string()));
        let exported = match parsed {
            Ok(exported) => exported,
            Err(e) => return self.fail(e),
        };

        if self.cache.topics().iter().any(|t| t.name == exported.name) {
            return self.fail(AppError::Import(format!(
                "topic '{}' already exists, rename it in the JSON file",
                exported.name
            )));
        }

        if let Some(card) = exported
            .flashcards
            .iter()
            .find(|c| c.front.trim().is_empty() || c.back.trim().is_empty())
        {
            return self.fail(AppError::Import(format!(
                "flashcard '{}' / '{}' has an empty side",
                card.front, card.back
            )));
        }

        let topic = self.create_topic(&exported.name).await?;
        for card in &exported.flashcards {
            if let Err(e) = self
                .store
                .create_flashcard(self.identity.as_ref(), topic.id, &card.front, &card.back)
                .await
            {
                // Remove the partial topic so the file can be imported again
                if let Err(cleanup) = self
                    .store
                    .delete_topic(self.identity.as_ref(), topic.id)
                    .await
                {
                    tracing::error!(
                        "Failed to remove partially imported topic {}: {}",
                        topic.id,
                        cleanup
                    );
                }
                self.refresh_topics().await;
                let err = AppError::Import(format!(
                    "failed to import flashcard '{}': {}",
                    card.front, e
                ));
                return self.fail(err);
            }
        }
        tracing::info!(
            "Topic '{}' imported with {} cards",
            topic.name,
            exported.flashcards.len()
        );
        Ok(topic)
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            identity: self.identity.clone(),
            topics: self.cache.topics().to_vec(),
            selected: self.cache.selected().cloned(),
            flashcards: self.cache.flashcards().to_vec(),
            scores: self.cache.scores().to_vec(),
            session: self.engine.session().map(PracticeSession::view),
            last_result: self.engine.last_result().map(str::to_string),
            last_error: self.last_error.clone(),
        }
    }
}
