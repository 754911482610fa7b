//! Review scheduler: applies a rating to a card's stored progress and keeps
//! the daily streak and study log in step.
//!
//! Storage is reached only through [`ProgressStore`] and [`StreakStore`], and
//! time only through a [`Clock`]. Transaction boundaries belong to the caller;
//! see [`crate::database::review::rate_card`].

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{CardProgress, DailyStudyLog, Rating, UserStreak, sm2};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub trait ProgressStore {
    fn load_progress(&self, card_id: i64) -> Result<Option<CardProgress>>;
    fn save_progress(&self, progress: &CardProgress) -> Result<()>;
}

pub trait StreakStore {
    fn load_streak(&self) -> Result<UserStreak>;
    fn save_streak(&self, streak: &UserStreak) -> Result<()>;
    /// Increments today's study log, creating it if needed. Must be a single
    /// atomic step so concurrent ratings on the same day do not lose counts.
    fn record_study(&self, day: NaiveDate, daily_goal: u32) -> Result<DailyStudyLog>;
}

/// What the caller gets back after a rating.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub card_id: i64,
    pub rating: Rating,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub srs_level: u32,
    pub next_review: Option<DateTime<Utc>>,
    pub streak: UserStreak,
    pub daily_log: DailyStudyLog,
}

pub struct Scheduler<C> {
    clock: C,
    daily_goal: u32,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C, daily_goal: u32) -> Self {
        Self { clock, daily_goal }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Rates one card and records the study event for today.
    ///
    /// The rating is validated before any storage access.
    pub fn rate_card<S>(&self, store: &S, card_id: i64, rating: i64) -> Result<ReviewOutcome>
    where
        S: ProgressStore + StreakStore,
    {
        let rating = Rating::try_from(rating)?;
        let progress = store
            .load_progress(card_id)?
            .ok_or_else(|| Error::card_not_found(card_id))?;

        let now = self.clock.now();
        let updated = sm2::calculate_next_review(&progress, rating, now);
        store.save_progress(&updated)?;

        let today = now.date_naive();
        let streak = self.update_user_streak(store, today)?;
        let daily_log = store.record_study(today, self.daily_goal)?;

        tracing::debug!(
            card_id,
            rating = rating.value(),
            interval_days = updated.interval_days,
            ease_factor = updated.ease_factor,
            srs_level = updated.srs_level,
            "card rated"
        );

        Ok(ReviewOutcome {
            card_id,
            rating,
            interval_days: updated.interval_days,
            ease_factor: updated.ease_factor,
            srs_level: updated.srs_level,
            next_review: updated.next_review,
            streak,
            daily_log,
        })
    }

    /// Counts `today` towards the streak. Idempotent within a calendar day.
    pub fn update_user_streak<S: StreakStore>(
        &self,
        store: &S,
        today: NaiveDate,
    ) -> Result<UserStreak> {
        let current = store.load_streak()?;
        match current.advance(today) {
            Some(next) => {
                store.save_streak(&next)?;
                tracing::info!(
                    current_streak = next.current_streak,
                    longest_streak = next.longest_streak,
                    %today,
                    "study streak updated"
                );
                Ok(next)
            }
            None => Ok(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        progress: RefCell<HashMap<i64, CardProgress>>,
        streak: RefCell<UserStreak>,
        logs: RefCell<HashMap<NaiveDate, DailyStudyLog>>,
        reads: Cell<u32>,
    }

    impl ProgressStore for MemoryStore {
        fn load_progress(&self, card_id: i64) -> Result<Option<CardProgress>> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.progress.borrow().get(&card_id).cloned())
        }

        fn save_progress(&self, progress: &CardProgress) -> Result<()> {
            self.progress.borrow_mut().insert(progress.card_id, progress.clone());
            Ok(())
        }
    }

    impl StreakStore for MemoryStore {
        fn load_streak(&self) -> Result<UserStreak> {
            Ok(self.streak.borrow().clone())
        }

        fn save_streak(&self, streak: &UserStreak) -> Result<()> {
            *self.streak.borrow_mut() = streak.clone();
            Ok(())
        }

        fn record_study(&self, day: NaiveDate, daily_goal: u32) -> Result<DailyStudyLog> {
            let mut logs = self.logs.borrow_mut();
            let log = logs.entry(day).or_insert(DailyStudyLog {
                study_date: day,
                cards_studied: 0,
                minutes_studied: 0,
                streak_maintained: true,
                daily_goal_met: false,
            });
            log.cards_studied += 1;
            log.minutes_studied += 1;
            log.daily_goal_met = log.cards_studied >= daily_goal;
            Ok(log.clone())
        }
    }

    fn at(day: u32) -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, day, 8, 0, 0).unwrap())
    }

    fn store_with(progress: CardProgress) -> MemoryStore {
        let store = MemoryStore::default();
        store.save_progress(&progress).unwrap();
        store
    }

    fn progress(
        ease_factor: f64,
        interval_days: u32,
        repetitions: u32,
        srs_level: u32,
    ) -> CardProgress {
        CardProgress {
            srs_level,
            ease_factor,
            interval_days,
            repetitions,
            ..CardProgress::new(11, 2, at(1).now())
        }
    }

    #[test]
    fn test_good_rating_persists_progress() {
        let store = store_with(progress(2.5, 6, 2, 2));
        let scheduler = Scheduler::new(at(3), 20);

        let outcome = scheduler.rate_card(&store, 11, 3).unwrap();

        let saved = store.progress.borrow()[&11].clone();
        assert_eq!(saved.repetitions, 3);
        assert_eq!(saved.srs_level, 3);
        assert_eq!(saved.interval_days, (6.0 * saved.ease_factor).round() as u32);
        assert_eq!(outcome.interval_days, saved.interval_days);
        assert_eq!(outcome.ease_factor, saved.ease_factor);
        assert_eq!(saved.last_reviewed, Some(at(3).now()));
    }

    #[test]
    fn test_again_rating_resets() {
        let store = store_with(progress(2.5, 10, 3, 4));
        let scheduler = Scheduler::new(at(3), 20);

        let outcome = scheduler.rate_card(&store, 11, 1).unwrap();

        let saved = store.progress.borrow()[&11].clone();
        assert_eq!(saved.repetitions, 0);
        assert_eq!(saved.interval_days, 1);
        assert_eq!(saved.srs_level, 3);
        assert_eq!(outcome.srs_level, 3);
    }

    #[test]
    fn test_invalid_rating_rejected_before_storage() {
        let store = store_with(progress(2.5, 0, 0, 0));
        let scheduler = Scheduler::new(at(3), 20);

        for rating in [0, 5, -3] {
            let err = scheduler.rate_card(&store, 11, rating).unwrap_err();
            assert!(matches!(err, Error::InvalidRating(r) if r == rating));
        }
        assert_eq!(store.reads.get(), 0);
        assert_eq!(store.progress.borrow()[&11].total_reviews, 0);
    }

    #[test]
    fn test_missing_progress_is_not_found() {
        let store = MemoryStore::default();
        let scheduler = Scheduler::new(at(3), 20);

        let err = scheduler.rate_card(&store, 99, 3).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(*store.streak.borrow(), UserStreak::default());
    }

    #[test]
    fn test_streak_updates_once_per_day() {
        let store = MemoryStore::default();
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let scheduler = Scheduler::new(at(3), 20);

        let first = scheduler.update_user_streak(&store, today).unwrap();
        let second = scheduler.update_user_streak(&store, today).unwrap();

        assert_eq!(first, second);
        assert_eq!(second.total_streak_days, 1);
        assert_eq!(*store.streak.borrow(), first);
    }

    #[test]
    fn test_ratings_on_consecutive_days_extend_streak() {
        let store = store_with(progress(2.5, 0, 0, 0));

        for day in [3, 3, 4, 5] {
            Scheduler::new(at(day), 20).rate_card(&store, 11, 3).unwrap();
        }
        let outcome = Scheduler::new(at(7), 20).rate_card(&store, 11, 4).unwrap();

        assert_eq!(outcome.streak.current_streak, 1);
        assert_eq!(outcome.streak.longest_streak, 3);
        assert_eq!(outcome.streak.total_streak_days, 4);
    }

    #[test]
    fn test_daily_log_counts_every_rating() {
        let store = store_with(progress(2.5, 0, 0, 0));
        let scheduler = Scheduler::new(at(3), 2);

        let first = scheduler.rate_card(&store, 11, 2).unwrap();
        assert_eq!(first.daily_log.cards_studied, 1);
        assert!(!first.daily_log.daily_goal_met);

        let second = scheduler.rate_card(&store, 11, 3).unwrap();
        assert_eq!(second.daily_log.cards_studied, 2);
        assert_eq!(second.daily_log.minutes_studied, 2);
        assert!(second.daily_log.daily_goal_met);
    }
}
