//! Spaced-repetition state for one card.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
/// Longest gap between reviews, roughly a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;
/// Cards at or above this level count as mastered.
pub const MASTERED_SRS_LEVEL: u32 = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardProgress {
    pub card_id: i64,
    pub deck_id: i64,
    pub srs_level: u32,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub total_reviews: u32,
    pub correct_reviews: u32,
    pub streak_current: u32,
    pub streak_best: u32,
    pub next_review: Option<DateTime<Utc>>,
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl CardProgress {
    /// Fresh progress for a newly added card, due immediately.
    pub fn new(card_id: i64, deck_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            card_id,
            deck_id,
            srs_level: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            total_reviews: 0,
            correct_reviews: 0,
            streak_current: 0,
            streak_best: 0,
            next_review: Some(now),
            last_reviewed: None,
        }
    }
}
