//! SQLite-backed store for topics, flashcards and scores
//!
//! Every query is scoped to the calling identity. Rows owned by someone else
//! behave exactly like rows that do not exist. Deleting a topic cascades to its
//! flashcards and scores through foreign keys.

use super::gateway::{RemoteStore, require_identity};
use crate::errors::StoreError;
use crate::models::{
    Clock, Flashcard, FlashcardId, Identity, ScoreRecord, SystemClock, Topic, TopicId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure all tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, Arc::new(SystemClock))
    }

    pub fn open_in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, clock)
    }

    /// Initializes tables for topics, flashcards and score history
    pub fn with_connection(conn: Connection, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                next_review INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS flashcards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                correct_count INTEGER NOT NULL CHECK (correct_count >= 0),
                incorrect_count INTEGER NOT NULL CHECK (incorrect_count >= 0),
                timestamp INTEGER NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_topics_owner ON topics(owner);
            CREATE INDEX IF NOT EXISTS idx_flashcards_topic ON flashcards(topic_id);
            CREATE INDEX IF NOT EXISTS idx_scores_topic ON scores(topic_id);",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            clock,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Transient("database connection poisoned".to_string()))
    }

    fn owns_topic(conn: &Connection, owner: &Identity, topic_id: TopicId) -> Result<bool, StoreError> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM topics WHERE id = ?1 AND owner = ?2",
                params![topic_id, owner.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn get_topic(conn: &Connection, owner: &Identity, topic_id: TopicId) -> Result<Topic, StoreError> {
        conn.query_row(
            "SELECT id, owner, name, created_at, next_review FROM topics WHERE id = ?1 AND owner = ?2",
            params![topic_id, owner.as_str()],
            topic_from_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }
}

fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn topic_from_row(row: &Row<'_>) -> rusqlite::Result<Topic> {
    Ok(Topic {
        id: row.get(0)?,
        owner: Identity::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        created_at: from_millis(row.get(3)?),
        next_review: from_millis(row.get(4)?),
    })
}

fn flashcard_from_row(row: &Row<'_>) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        created_at: from_millis(row.get(4)?),
    })
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<ScoreRecord> {
    Ok(ScoreRecord {
        id: row.get(0)?,
        topic_id: row.get(1)?,
        correct_count: row.get(2)?,
        incorrect_count: row.get(3)?,
        timestamp: from_millis(row.get(4)?),
    })
}

fn require_text<'a>(value: &'a str, what: &str) -> Result<&'a str, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Rejected(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn list_topics(&self, caller: Option<&Identity>) -> Result<Vec<Topic>, StoreError> {
        let owner = require_identity(caller)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, owner, name, created_at, next_review FROM topics WHERE owner = ?1 ORDER BY id",
        )?;
        let topics = stmt
            .query_map(params![owner.as_str()], topic_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(topics)
    }

    async fn create_topic(
        &self,
        caller: Option<&Identity>,
        name: &str,
        initial_next_review: DateTime<Utc>,
    ) -> Result<Topic, StoreError> {
        let owner = require_identity(caller)?;
        let name = require_text(name, "topic name")?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO topics (owner, name, created_at, next_review) VALUES (?1, ?2, ?3, ?4)",
            params![
                owner.as_str(),
                name,
                to_millis(self.clock.now()),
                to_millis(initial_next_review)
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::debug!("Topic '{}' created with id {}", name, id);
        Self::get_topic(&conn, owner, id)
    }

    async fn delete_topic(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<bool, StoreError> {
        let owner = require_identity(caller)?;
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM topics WHERE id = ?1 AND owner = ?2",
            params![topic_id, owner.as_str()],
        )?;
        Ok(deleted > 0)
    }

    async fn set_topic_next_review(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        next_review: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let owner = require_identity(caller)?;
        if next_review < DateTime::<Utc>::UNIX_EPOCH {
            return Err(StoreError::Rejected(
                "next review must not be before the epoch".to_string(),
            ));
        }
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE topics SET next_review = ?1 WHERE id = ?2 AND owner = ?3",
            params![to_millis(next_review), topic_id, owner.as_str()],
        )?;
        Ok(updated > 0)
    }

    async fn list_flashcards(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<Vec<Flashcard>, StoreError> {
        let owner = require_identity(caller)?;
        let conn = self.lock()?;
        if !Self::owns_topic(&conn, owner, topic_id)? {
            return Err(StoreError::NotFound);
        }
        let mut stmt = conn.prepare(
            "SELECT id, topic_id, front, back, created_at FROM flashcards
             WHERE topic_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let cards = stmt
            .query_map(params![topic_id], flashcard_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    async fn create_flashcard(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        front: &str,
        back: &str,
    ) -> Result<Flashcard, StoreError> {
        let owner = require_identity(caller)?;
        let front = require_text(front, "front")?;
        let back = require_text(back, "back")?;
        let conn = self.lock()?;
        if !Self::owns_topic(&conn, owner, topic_id)? {
            return Err(StoreError::Rejected("unknown topic".to_string()));
        }
        conn.execute(
            "INSERT INTO flashcards (topic_id, front, back, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![topic_id, front, back, to_millis(self.clock.now())],
        )?;
        let id = conn.last_insert_rowid();
        let card = conn.query_row(
            "SELECT id, topic_id, front, back, created_at FROM flashcards WHERE id = ?1",
            params![id],
            flashcard_from_row,
        )?;
        Ok(card)
    }

    async fn update_flashcard(
        &self,
        caller: Option<&Identity>,
        card_id: FlashcardId,
        front: &str,
        back: &str,
    ) -> Result<bool, StoreError> {
        let owner = require_identity(caller)?;
        let front = require_text(front, "front")?;
        let back = require_text(back, "back")?;
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE flashcards SET front = ?1, back = ?2
             WHERE id = ?3
               AND topic_id IN (SELECT id FROM topics WHERE owner = ?4)",
            params![front, back, card_id, owner.as_str()],
        )?;
        Ok(updated > 0)
    }

    async fn delete_flashcard(
        &self,
        caller: Option<&Identity>,
        card_id: FlashcardId,
    ) -> Result<bool, StoreError> {
        let owner = require_identity(caller)?;
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM flashcards
             WHERE id = ?1
               AND topic_id IN (SELECT id FROM topics WHERE owner = ?2)",
            params![card_id, owner.as_str()],
        )?;
        Ok(deleted > 0)
    }

    async fn list_score_history(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<Vec<ScoreRecord>, StoreError> {
        let owner = require_identity(caller)?;
        let conn = self.lock()?;
        if !Self::owns_topic(&conn, owner, topic_id)? {
            return Err(StoreError::NotFound);
        }
        let mut stmt = conn.prepare(
            "SELECT id, topic_id, correct_count, incorrect_count, timestamp FROM scores
             WHERE topic_id = ?1
             ORDER BY timestamp DESC, id DESC",
        )?;
        let scores = stmt
            .query_map(params![topic_id], score_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(scores)
    }

    async fn record_score(
        &self,
        caller: Option<&Identity>,
        topic_id: TopicId,
        correct_count: u32,
        incorrect_count: u32,
    ) -> Result<ScoreRecord, StoreError> {
        let owner = require_identity(caller)?;
        let conn = self.lock()?;
        if !Self::owns_topic(&conn, owner, topic_id)? {
            return Err(StoreError::Rejected("unknown topic".to_string()));
        }
        conn.execute(
            "INSERT INTO scores (topic_id, correct_count, incorrect_count, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                topic_id,
                correct_count,
                incorrect_count,
                to_millis(self.clock.now())
            ],
        )?;
        let id = conn.last_insert_rowid();
        let score = conn.query_row(
            "SELECT id, topic_id, correct_count, incorrect_count, timestamp FROM scores WHERE id = ?1",
            params![id],
            score_from_row,
        )?;
        Ok(score)
    }
}
