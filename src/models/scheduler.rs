//! Review scheduling for topics.
//!
//! After a practice session the topic's next review is pushed out according to
//! the share of cards answered correctly:
//! - ratio >= 0.9: review again in 7 days
//! - 0.6 <= ratio < 0.9: review again in 3 days
//! - ratio < 0.6 (including a session with no answers): review again tomorrow
//!
//! A reminder can also be set by hand; it skips the ratio entirely but must lie
//! strictly in the future.

use crate::errors::AppError;
use chrono::{DateTime, Duration, Utc};

const HIGH_TIER_RATIO: f64 = 0.9;
const MID_TIER_RATIO: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewTier {
    Low,
    Mid,
    High,
}

impl ReviewTier {
    pub fn from_counts(correct_count: u32, incorrect_count: u32) -> Self {
        let total = correct_count as u64 + incorrect_count as u64;
        let ratio = if total == 0 {
            0.0
        } else {
            correct_count as f64 / total as f64
        };

        if ratio >= HIGH_TIER_RATIO {
            ReviewTier::High
        } else if ratio >= MID_TIER_RATIO {
            ReviewTier::Mid
        } else {
            ReviewTier::Low
        }
    }

    pub fn delay(self) -> Duration {
        match self {
            ReviewTier::High => Duration::days(7),
            ReviewTier::Mid => Duration::days(3),
            ReviewTier::Low => Duration::days(1),
        }
    }
}

/// Calculates when a topic should next be reviewed given a session outcome.
pub fn compute_next_review(
    correct_count: u32,
    incorrect_count: u32,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    now + ReviewTier::from_counts(correct_count, incorrect_count).delay()
}

/// Checks a hand-picked reminder before it is sent to the store.
///
/// The remote clock stays authoritative; this only catches obvious mistakes.
pub fn validate_manual_reminder(
    target: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, AppError> {
    if target <= now {
        return Err(AppError::ReminderNotInFuture);
    }
    Ok(target)
}
