//! Immutable outcome of one completed practice session.
use super::{ScoreId, TopicId};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub topic_id: TopicId,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub timestamp: DateTime<Utc>,
}
