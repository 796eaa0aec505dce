//! Topic is a named collection of flashcards owned by one identity
use super::{Identity, TopicId};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topic {
    pub id: TopicId,
    pub owner: Identity,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
}

impl Topic {
    /// A topic is due once its scheduled review time has been reached.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn topic_due_at(next_review: DateTime<Utc>) -> Topic {
        Topic {
            id: 1,
            owner: Identity::new("alice"),
            name: "Kanji".to_string(),
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
            next_review,
        }
    }

    #[test]
    fn test_due_when_review_time_reached() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert!(topic_due_at(now).is_due(now));
        assert!(topic_due_at(now - Duration::hours(1)).is_due(now));
        assert!(!topic_due_at(now + Duration::seconds(1)).is_due(now));
    }
}
