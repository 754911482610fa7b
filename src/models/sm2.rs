//! SM-2 (SuperMemo 2) spaced repetition, adapted to a four-button rating.
//!
//! - Again/Hard: repetitions reset to 0 and the card comes back tomorrow.
//!   The easiness factor (EF) is left alone.
//! - Good/Easy: the interval grows 1 day → 6 days → previous interval × EF,
//!   and EF is adjusted by the SM-2 formula, floored at 1.3. The interval
//!   is capped at `MAX_INTERVAL_DAYS`.
//! - The SRS level moves one step per review and never drops below 0.

use super::card_progress::{CardProgress, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR};
use super::Rating;
use chrono::{DateTime, Duration, Utc};

/// Applies one review to `progress` and returns the updated record.
pub fn calculate_next_review(
    progress: &CardProgress,
    rating: Rating,
    now: DateTime<Utc>,
) -> CardProgress {
    let ease_factor = progress.ease_factor.max(MIN_EASE_FACTOR);

    let (new_ef, new_interval, new_repetitions) = if rating.is_correct() {
        let q = rating.value() as f64;
        let new_ef = (ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02)))
            .max(MIN_EASE_FACTOR);

        let new_reps = progress.repetitions + 1;
        let new_int = match new_reps {
            1 => 1,
            2 => 6,
            _ => (progress.interval_days as f64 * new_ef)
                .round()
                .clamp(1.0, f64::from(MAX_INTERVAL_DAYS)) as u32,
        };
        (new_ef, new_int, new_reps)
    } else {
        (ease_factor, 1, 0)
    };

    let next_review = now
        .checked_add_signed(Duration::days(i64::from(new_interval)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let (srs_level, streak_current, correct_reviews) = if rating.is_correct() {
        (
            progress.srs_level + 1,
            progress.streak_current + 1,
            progress.correct_reviews + 1,
        )
    } else {
        (
            progress.srs_level.saturating_sub(1),
            0,
            progress.correct_reviews,
        )
    };

    CardProgress {
        card_id: progress.card_id,
        deck_id: progress.deck_id,
        srs_level,
        ease_factor: new_ef,
        interval_days: new_interval,
        repetitions: new_repetitions,
        total_reviews: progress.total_reviews + 1,
        correct_reviews,
        streak_current,
        streak_best: progress.streak_best.max(streak_current),
        next_review: Some(next_review),
        last_reviewed: Some(now),
    }
}
