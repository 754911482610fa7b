//! SQLite-backed progress, streak and study-log stores.

use super::db::{from_timestamp, to_timestamp};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{CardProgress, DEFAULT_EASE_FACTOR, DailyStudyLog, UserStreak};
use crate::scheduler::{ProgressStore, ReviewOutcome, Scheduler, StreakStore};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};

/// Rates a card inside one `BEGIN IMMEDIATE` transaction.
///
/// Progress, streak and daily log commit together or not at all.
pub fn rate_card<C: Clock>(
    conn: &mut Connection,
    scheduler: &Scheduler<C>,
    card_id: i64,
    rating: i64,
) -> Result<ReviewOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = scheduler.rate_card(&*tx, card_id, rating)?;
    tx.commit()?;
    Ok(outcome)
}

fn progress_from_row(row: &Row) -> rusqlite::Result<CardProgress> {
    Ok(CardProgress {
        card_id: row.get(0)?,
        deck_id: row.get(1)?,
        srs_level: row.get(2)?,
        ease_factor: row.get::<_, Option<f64>>(3)?.unwrap_or(DEFAULT_EASE_FACTOR),
        interval_days: row.get::<_, Option<u32>>(4)?.unwrap_or(0),
        repetitions: row.get::<_, Option<u32>>(5)?.unwrap_or(0),
        next_review: row.get::<_, Option<i64>>(6)?.map(from_timestamp),
        last_reviewed: row.get::<_, Option<i64>>(7)?.map(from_timestamp),
        total_reviews: row.get(8)?,
        correct_reviews: row.get(9)?,
        streak_current: row.get(10)?,
        streak_best: row.get(11)?,
    })
}

pub(crate) fn insert_progress(progress: &CardProgress, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO card_progress
            (card_id, deck_id, srs_level, ease_factor, interval_days, repetitions, next_review,
             last_reviewed, total_reviews, correct_reviews, streak_current, streak_best)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            progress.card_id,
            progress.deck_id,
            progress.srs_level,
            progress.ease_factor,
            progress.interval_days,
            progress.repetitions,
            progress.next_review.map(to_timestamp),
            progress.last_reviewed.map(to_timestamp),
            progress.total_reviews,
            progress.correct_reviews,
            progress.streak_current,
            progress.streak_best
        ],
    )?;
    Ok(())
}

pub fn daily_log(day: NaiveDate, conn: &Connection) -> Result<Option<DailyStudyLog>> {
    let log = conn
        .query_row(
            "SELECT study_date, cards_studied, minutes_studied, streak_maintained, daily_goal_met
             FROM daily_study_logs WHERE study_date = ?1",
            params![day],
            log_from_row,
        )
        .optional()?;
    Ok(log)
}

fn log_from_row(row: &Row) -> rusqlite::Result<DailyStudyLog> {
    Ok(DailyStudyLog {
        study_date: row.get(0)?,
        cards_studied: row.get(1)?,
        minutes_studied: row.get(2)?,
        streak_maintained: row.get(3)?,
        daily_goal_met: row.get(4)?,
    })
}

impl ProgressStore for Connection {
    fn load_progress(&self, card_id: i64) -> Result<Option<CardProgress>> {
        let progress = self
            .query_row(
                "SELECT card_id, deck_id, srs_level, ease_factor, interval_days, repetitions,
                        next_review, last_reviewed, total_reviews, correct_reviews,
                        streak_current, streak_best
                 FROM card_progress WHERE card_id = ?1",
                params![card_id],
                progress_from_row,
            )
            .optional()?;
        Ok(progress)
    }

    fn save_progress(&self, progress: &CardProgress) -> Result<()> {
        let changed = self.execute(
            "UPDATE card_progress
             SET srs_level = ?1, ease_factor = ?2, interval_days = ?3, repetitions = ?4,
                 next_review = ?5, last_reviewed = ?6, total_reviews = ?7,
                 correct_reviews = ?8, streak_current = ?9, streak_best = ?10
             WHERE card_id = ?11",
            params![
                progress.srs_level,
                progress.ease_factor,
                progress.interval_days,
                progress.repetitions,
                progress.next_review.map(to_timestamp),
                progress.last_reviewed.map(to_timestamp),
                progress.total_reviews,
                progress.correct_reviews,
                progress.streak_current,
                progress.streak_best,
                progress.card_id
            ],
        )?;

        if changed == 0 {
            return Err(Error::card_not_found(progress.card_id));
        }
        Ok(())
    }
}

impl StreakStore for Connection {
    fn load_streak(&self) -> Result<UserStreak> {
        let streak = self
            .query_row(
                "SELECT current_streak, longest_streak, total_streak_days, last_study_date
                 FROM user_streaks WHERE id = 1",
                [],
                |row| {
                    Ok(UserStreak {
                        current_streak: row.get(0)?,
                        longest_streak: row.get(1)?,
                        total_streak_days: row.get(2)?,
                        last_study_date: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(streak.unwrap_or_default())
    }

    fn save_streak(&self, streak: &UserStreak) -> Result<()> {
        self.execute(
            "INSERT INTO user_streaks
                (id, current_streak, longest_streak, total_streak_days, last_study_date)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                current_streak = excluded.current_streak,
                longest_streak = excluded.longest_streak,
                total_streak_days = excluded.total_streak_days,
                last_study_date = excluded.last_study_date",
            params![
                streak.current_streak,
                streak.longest_streak,
                streak.total_streak_days,
                streak.last_study_date
            ],
        )?;
        Ok(())
    }

    fn record_study(&self, day: NaiveDate, daily_goal: u32) -> Result<DailyStudyLog> {
        let log = self.query_row(
            "INSERT INTO daily_study_logs
                (study_date, cards_studied, minutes_studied, streak_maintained, daily_goal_met)
             VALUES (?1, 1, 1, 1, 1 >= ?2)
             ON CONFLICT(study_date) DO UPDATE SET
                cards_studied = cards_studied + 1,
                minutes_studied = minutes_studied + 1,
                streak_maintained = 1,
                daily_goal_met = cards_studied + 1 >= ?2
             RETURNING study_date, cards_studied, minutes_studied, streak_maintained,
                       daily_goal_met",
            params![day, daily_goal],
            log_from_row,
        )?;
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::db::{add_card, create_deck, open_database, open_in_memory};
    use crate::models::{NewCard, NewDeck};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, day, 12, 0, 0).unwrap()
    }

    fn setup() -> (Connection, i64) {
        let mut conn = open_in_memory().unwrap();
        let deck_id = create_deck(&NewDeck::named("Colours"), at(1), &conn).unwrap();
        let card_id = add_card(deck_id, &NewCard::new("红", "red"), at(1), &mut conn).unwrap();
        (conn, card_id)
    }

    #[test]
    fn test_progress_roundtrip_through_store() {
        let (conn, card_id) = setup();
        let mut progress = conn.load_progress(card_id).unwrap().unwrap();
        assert_eq!(progress.ease_factor, 2.5);
        assert_eq!(progress.next_review, Some(at(1)));

        progress.srs_level = 2;
        progress.interval_days = 6;
        progress.last_reviewed = Some(at(2));
        conn.save_progress(&progress).unwrap();

        assert_eq!(conn.load_progress(card_id).unwrap().unwrap(), progress);
    }

    #[test]
    fn test_null_columns_take_defaults() {
        let (conn, card_id) = setup();
        conn.execute(
            "UPDATE card_progress SET ease_factor = NULL, interval_days = NULL, repetitions = NULL
             WHERE card_id = ?1",
            params![card_id],
        )
        .unwrap();

        let progress = conn.load_progress(card_id).unwrap().unwrap();
        assert_eq!(progress.ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(progress.interval_days, 0);
        assert_eq!(progress.repetitions, 0);
    }

    #[test]
    fn test_save_unknown_progress_is_not_found() {
        let (conn, card_id) = setup();
        let mut progress = conn.load_progress(card_id).unwrap().unwrap();
        progress.card_id = 777;
        assert!(conn.save_progress(&progress).unwrap_err().is_not_found());
    }

    #[test]
    fn test_rate_card_scenarios() {
        let (mut conn, card_id) = setup();
        conn.execute(
            "UPDATE card_progress
             SET ease_factor = 2.5, interval_days = 6, repetitions = 2, srs_level = 2
             WHERE card_id = ?1",
            params![card_id],
        )
        .unwrap();

        let scheduler = Scheduler::new(FixedClock(at(5)), 20);
        let outcome = rate_card(&mut conn, &scheduler, card_id, 3).unwrap();

        let saved = conn.load_progress(card_id).unwrap().unwrap();
        assert_eq!(saved.repetitions, 3);
        assert_eq!(saved.srs_level, 3);
        assert_eq!(saved.interval_days, (6.0 * saved.ease_factor).round() as u32);
        assert_eq!(
            saved.next_review,
            Some(at(5) + Duration::days(i64::from(saved.interval_days)))
        );
        assert_eq!(outcome.interval_days, saved.interval_days);

        conn.execute(
            "UPDATE card_progress SET interval_days = 10, repetitions = 3, srs_level = 4
             WHERE card_id = ?1",
            params![card_id],
        )
        .unwrap();
        rate_card(&mut conn, &scheduler, card_id, 1).unwrap();

        let saved = conn.load_progress(card_id).unwrap().unwrap();
        assert_eq!(saved.repetitions, 0);
        assert_eq!(saved.interval_days, 1);
        assert_eq!(saved.srs_level, 3);
        assert_eq!(saved.total_reviews, 2);
        assert_eq!(saved.correct_reviews, 1);
    }

    #[test]
    fn test_rate_card_failures_leave_no_trace() {
        let (mut conn, card_id) = setup();
        let scheduler = Scheduler::new(FixedClock(at(5)), 20);

        let err = rate_card(&mut conn, &scheduler, card_id, 9).unwrap_err();
        assert!(matches!(err, Error::InvalidRating(9)));

        let err = rate_card(&mut conn, &scheduler, 4040, 3).unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(conn.load_streak().unwrap(), UserStreak::default());
        assert_eq!(daily_log(at(5).date_naive(), &conn).unwrap(), None);
        assert_eq!(conn.load_progress(card_id).unwrap().unwrap().total_reviews, 0);
    }

    #[test]
    fn test_daily_log_increments() {
        let (mut conn, card_id) = setup();
        let scheduler = Scheduler::new(FixedClock(at(5)), 3);

        for rating in [1, 3, 4] {
            rate_card(&mut conn, &scheduler, card_id, rating).unwrap();
        }

        let log = daily_log(at(5).date_naive(), &conn).unwrap().unwrap();
        assert_eq!(log.cards_studied, 3);
        assert_eq!(log.minutes_studied, 3);
        assert!(log.streak_maintained);
        assert!(log.daily_goal_met);

        let streak = conn.load_streak().unwrap();
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.total_streak_days, 1);
    }

    #[test]
    fn test_record_study_goal_flag() {
        let conn = open_in_memory().unwrap();
        let day = at(9).date_naive();

        let first = conn.record_study(day, 2).unwrap();
        assert_eq!(first.cards_studied, 1);
        assert!(!first.daily_goal_met);

        let second = conn.record_study(day, 2).unwrap();
        assert_eq!(second.cards_studied, 2);
        assert!(second.daily_goal_met);
    }

    #[test]
    fn test_streak_across_days() {
        let (mut conn, card_id) = setup();

        for day in [5, 6, 7] {
            let scheduler = Scheduler::new(FixedClock(at(day)), 20);
            rate_card(&mut conn, &scheduler, card_id, 3).unwrap();
        }
        let scheduler = Scheduler::new(FixedClock(at(10)), 20);
        let outcome = rate_card(&mut conn, &scheduler, card_id, 3).unwrap();

        assert_eq!(outcome.streak.current_streak, 1);
        assert_eq!(outcome.streak.longest_streak, 3);
        assert_eq!(outcome.streak.total_streak_days, 4);
        assert_eq!(outcome.streak.last_study_date, Some(at(10).date_naive()));
        assert_eq!(conn.load_streak().unwrap(), outcome.streak);
    }

    #[test]
    fn test_update_user_streak_idempotent_in_storage() {
        let conn = open_in_memory().unwrap();
        let scheduler = Scheduler::new(FixedClock(at(3)), 20);
        let today = at(3).date_naive();

        scheduler.update_user_streak(&conn, today).unwrap();
        let after_first = conn.load_streak().unwrap();
        scheduler.update_user_streak(&conn, today).unwrap();

        assert_eq!(conn.load_streak().unwrap(), after_first);
    }

    #[test]
    fn test_concurrent_ratings_keep_every_increment() {
        const THREADS: u32 = 4;
        const RATINGS: u32 = 25;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.sqlite3");

        let card_id = {
            let mut conn = open_database(&path).unwrap();
            let deck_id = create_deck(&NewDeck::named("Numbers"), at(1), &conn).unwrap();
            add_card(deck_id, &NewCard::new("八", "eight"), at(1), &mut conn).unwrap()
        };

        let connections: Vec<Connection> =
            (0..THREADS).map(|_| open_database(&path).unwrap()).collect();
        let handles: Vec<_> = connections
            .into_iter()
            .map(|mut conn| {
                std::thread::spawn(move || {
                    let scheduler = Scheduler::new(FixedClock(at(12)), 20);
                    for _ in 0..RATINGS {
                        rate_card(&mut conn, &scheduler, card_id, 2).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let conn = open_database(&path).unwrap();
        let log = daily_log(at(12).date_naive(), &conn).unwrap().unwrap();
        assert_eq!(log.cards_studied, THREADS * RATINGS);
        assert_eq!(log.minutes_studied, THREADS * RATINGS);

        let progress = conn.load_progress(card_id).unwrap().unwrap();
        assert_eq!(progress.total_reviews, THREADS * RATINGS);
        assert_eq!(progress.correct_reviews, 0);

        let streak = conn.load_streak().unwrap();
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.total_streak_days, 1);
    }
}
