//! Practice session management.
//! Runs one shuffled pass over a topic's flashcards, tallies answers and, once
//! the last card is graded, records the score and schedules the next review.
//!
//! The engine is either idle or holds exactly one active session. Completion is
//! not a resting state: the session is dropped before the store is contacted,
//! so a failed score upload never brings it back.

use super::scheduler::compute_next_review;
use super::{Flashcard, Identity, ScoreRecord, Topic, TopicId};
use crate::database::RemoteStore;
use crate::errors::{AppError, StoreError};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

/// One run through a fixed, shuffled copy of a topic's cards.
#[derive(Clone, Debug)]
pub struct PracticeSession {
    pub topic_id: TopicId,
    pub topic_name: String,
    ordered_cards: Vec<Flashcard>,
    current_index: usize,
    answer_revealed: bool,
    correct_count: u32,
    incorrect_count: u32,
}

impl PracticeSession {
    fn new_shuffled<R: Rng + ?Sized>(topic: &Topic, cards: &[Flashcard], rng: &mut R) -> Self {
        // The session owns its copy, later edits to the topic do not reach it
        let mut ordered_cards = cards.to_vec();
        ordered_cards.shuffle(rng);

        Self {
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            ordered_cards,
            current_index: 0,
            answer_revealed: false,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    pub fn ordered_cards(&self) -> &[Flashcard] {
        &self.ordered_cards
    }

    pub fn current_card(&self) -> Option<&Flashcard> {
        self.ordered_cards.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answer_revealed(&self) -> bool {
        self.answer_revealed
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    pub fn answered_count(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    pub fn total_count(&self) -> usize {
        self.ordered_cards.len()
    }

    pub fn view(&self) -> SessionView {
        let card = self.current_card();
        SessionView {
            topic_id: self.topic_id,
            topic_name: self.topic_name.clone(),
            position: self.current_index + 1,
            total: self.total_count(),
            front: card.map(|c| c.front.clone()).unwrap_or_default(),
            back: card
                .filter(|_| self.answer_revealed)
                .map(|c| c.back.clone()),
            correct_count: self.correct_count,
            incorrect_count: self.incorrect_count,
        }
    }
}

/// Read-only picture of the running session for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub topic_id: TopicId,
    pub topic_name: String,
    /// 1-based
    pub position: usize,
    pub total: usize,
    pub front: String,
    /// Only present once the answer has been revealed.
    pub back: Option<String>,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

/// What happened when the last card of a session was graded.
#[derive(Clone, Debug)]
pub struct SessionResult {
    pub topic_id: TopicId,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// "<correct> / <total>"
    pub summary: String,
    pub next_review: DateTime<Utc>,
    pub score: Option<ScoreRecord>,
    pub scheduled: bool,
    /// Store failures while saving the outcome. The session is over regardless.
    pub errors: Vec<StoreError>,
}

impl SessionResult {
    pub fn is_saved(&self) -> bool {
        self.score.is_some() && self.scheduled
    }
}

#[derive(Clone, Debug)]
pub enum AnswerOutcome {
    /// Moved on to the next card.
    Next,
    Completed(SessionResult),
}

#[derive(Default)]
pub struct PracticeEngine {
    session: Option<PracticeSession>,
    last_result: Option<String>,
}

impl PracticeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&PracticeSession> {
        self.session.as_ref()
    }

    /// Summary of the most recently completed session, kept for display.
    pub fn last_result(&self) -> Option<&str> {
        self.last_result.as_deref()
    }

    pub fn start(&mut self, topic: &Topic, cards: &[Flashcard]) -> Result<(), AppError> {
        self.start_with_rng(topic, cards, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        &mut self,
        topic: &Topic,
        cards: &[Flashcard],
        rng: &mut R,
    ) -> Result<(), AppError> {
        if self.session.is_some() {
            return Err(AppError::PracticeActive);
        }
        if cards.is_empty() {
            tracing::warn!("Topic '{}' has no flashcards to practice", topic.name);
            return Err(AppError::EmptyTopic);
        }

        let session = PracticeSession::new_shuffled(topic, cards, rng);
        tracing::info!(
            "Practice started for topic '{}' with {} cards",
            topic.name,
            session.total_count()
        );
        self.session = Some(session);
        self.last_result = None;
        Ok(())
    }

    /// Shows the back of the current card. Returns false when there was nothing to reveal.
    pub fn reveal(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if !session.answer_revealed => {
                session.answer_revealed = true;
                true
            }
            _ => false,
        }
    }

    /// Grades the current card.
    ///
    /// Grading the last card ends the session: the final counts (including this
    /// answer) are recorded as a score and used to schedule the topic's next
    /// review. Store failures at that point are reported in the result only.
    pub async fn answer<S: RemoteStore + ?Sized>(
        &mut self,
        store: &S,
        caller: Option<&Identity>,
        is_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<AnswerOutcome, AppError> {
        let session = self.session.as_mut().ok_or(AppError::NoActivePractice)?;
        if !session.answer_revealed {
            return Err(AppError::AnswerHidden);
        }

        if is_correct {
            session.correct_count += 1;
        } else {
            session.incorrect_count += 1;
        }

        if session.current_index + 1 < session.ordered_cards.len() {
            session.current_index += 1;
            session.answer_revealed = false;
            return Ok(AnswerOutcome::Next);
        }

        let Some(finished) = self.session.take() else {
            return Err(AppError::NoActivePractice);
        };
        let result = Self::finish(finished, store, caller, now).await;
        self.last_result = Some(result.summary.clone());
        Ok(AnswerOutcome::Completed(result))
    }

    async fn finish<S: RemoteStore + ?Sized>(
        session: PracticeSession,
        store: &S,
        caller: Option<&Identity>,
        now: DateTime<Utc>,
    ) -> SessionResult {
        let correct = session.correct_count;
        let incorrect = session.incorrect_count;
        let summary = format!("{} / {}", correct, session.total_count());
        let next_review = compute_next_review(correct, incorrect, now);
        let mut errors = Vec::new();

        tracing::info!(
            "Practice completed for topic '{}': {}",
            session.topic_name,
            summary
        );

        let score = match store
            .record_score(caller, session.topic_id, correct, incorrect)
            .await
        {
            Ok(score) => Some(score),
            Err(e) => {
                tracing::error!("Failed to record score for topic {}: {}", session.topic_id, e);
                errors.push(e);
                None
            }
        };

        let scheduled = match store
            .set_topic_next_review(caller, session.topic_id, next_review)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                tracing::error!("Topic {} vanished before it could be rescheduled", session.topic_id);
                errors.push(StoreError::NotFound);
                false
            }
            Err(e) => {
                tracing::error!("Failed to schedule topic {}: {}", session.topic_id, e);
                errors.push(e);
                false
            }
        };

        SessionResult {
            topic_id: session.topic_id,
            correct_count: correct,
            incorrect_count: incorrect,
            summary,
            next_review,
            score,
            scheduled,
            errors,
        }
    }

    /// Abandons the running session without scoring it.
    pub fn exit(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                tracing::info!(
                    "Practice for topic '{}' abandoned after {} of {} cards",
                    session.topic_name,
                    session.answered_count(),
                    session.total_count()
                );
                true
            }
            None => false,
        }
    }

    /// Drops the session and any retained result, e.g. after sign-out.
    pub fn reset(&mut self) {
        self.session = None;
        self.last_result = None;
    }
}
