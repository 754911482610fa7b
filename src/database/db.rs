//! Database operations for the flashcard application
//!
//! Handles SQLite initialization, deck and card CRUD, study selection and
//! statistics. Spaced-repetition progress lives in [`super::review`].
//!
//! Instants are stored as UNIX seconds, calendar dates as `YYYY-MM-DD` text.

use crate::error::{Error, Result};
use crate::models::stats::{Dashboard, DeckStats, calculate_deck_stats, calculate_mastery_rate};
use crate::models::{
    Card, CardProgress, CardWithProgress, Deck, DeckSet, DeckSummary, MASTERED_SRS_LEVEL, NewCard,
    NewDeck, UserStreak,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

use super::review::{daily_log, insert_progress};
use crate::scheduler::StreakStore;

pub(crate) fn to_timestamp(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}

pub(crate) fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Opens (or creates) the database file and ensures the schema exists.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    tracing::info!(path = %path.display(), "database opened");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates all tables if missing and seeds the single streak row.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category TEXT NOT NULL DEFAULT 'Custom',
            level TEXT,
            color TEXT NOT NULL DEFAULT '#8b5cf6',
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            hanzi TEXT NOT NULL,
            english TEXT NOT NULL,
            pinyin TEXT NOT NULL DEFAULT '',
            traditional TEXT NOT NULL DEFAULT '',
            measure_word TEXT NOT NULL DEFAULT '',
            part_of_speech TEXT NOT NULL DEFAULT '',
            example_sentence TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            base64_audio TEXT NOT NULL DEFAULT '',
            is_archived INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (deck_id) REFERENCES decks(id)
        )",
        (),
    )?;

    // SM-2 columns are nullable; readers substitute the defaults
    conn.execute(
        "CREATE TABLE IF NOT EXISTS card_progress (
            card_id INTEGER PRIMARY KEY,
            deck_id INTEGER NOT NULL,
            srs_level INTEGER NOT NULL DEFAULT 0,
            ease_factor REAL DEFAULT 2.5,
            interval_days INTEGER DEFAULT 0,
            repetitions INTEGER DEFAULT 0,
            next_review INTEGER,
            last_reviewed INTEGER,
            total_reviews INTEGER NOT NULL DEFAULT 0,
            correct_reviews INTEGER NOT NULL DEFAULT 0,
            streak_current INTEGER NOT NULL DEFAULT 0,
            streak_best INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user_streaks (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            current_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            total_streak_days INTEGER NOT NULL DEFAULT 0,
            last_study_date TEXT
        )",
        (),
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_study_logs (
            study_date TEXT PRIMARY KEY,
            cards_studied INTEGER NOT NULL DEFAULT 0,
            minutes_studied INTEGER NOT NULL DEFAULT 0,
            streak_maintained INTEGER NOT NULL DEFAULT 0,
            daily_goal_met INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    // Key/value store for the simulated day offset
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO user_streaks (id, current_streak, longest_streak, total_streak_days)
         VALUES (1, 0, 0, 0)",
        (),
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('day_offset', '0')",
        (),
    )?;

    Ok(())
}

/// Days the simulated clock runs ahead of wall time
pub fn day_offset(conn: &Connection) -> Result<i64> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = 'day_offset'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// Moves the simulated clock one day forward and returns the new offset
pub fn advance_day(conn: &Connection) -> Result<i64> {
    let next = day_offset(conn)? + 1;

    conn.execute(
        "INSERT INTO app_state (key, value) VALUES ('day_offset', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![next.to_string()],
    )?;

    tracing::info!(day_offset = next, "advanced simulated day");
    Ok(next)
}

const DECK_COLUMNS: &str =
    "d.id, d.name, d.description, d.category, d.level, d.color, d.is_archived, d.created_at";

fn deck_from_row(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: row.get(0)?,
        details: NewDeck {
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            level: row.get(4)?,
            color: row.get(5)?,
        },
        is_archived: row.get(6)?,
        created_at: from_timestamp(row.get(7)?),
    })
}

/// Creates a new deck and returns its id
pub fn create_deck(deck: &NewDeck, now: DateTime<Utc>, conn: &Connection) -> Result<i64> {
    let name = deck.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("deck name is required".to_string()));
    }

    conn.execute(
        "INSERT INTO decks (name, description, category, level, color, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            deck.description,
            deck.category,
            deck.level,
            deck.color,
            to_timestamp(now)
        ],
    )?;

    let deck_id = conn.last_insert_rowid();
    tracing::info!(deck_id, name, "deck created");
    Ok(deck_id)
}

pub fn get_deck(deck_id: i64, conn: &Connection) -> Result<Deck> {
    conn.query_row(
        &format!("SELECT {DECK_COLUMNS} FROM decks d WHERE d.id = ?1"),
        params![deck_id],
        deck_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::deck_not_found(deck_id))
}

/// Active decks with their active card counts, newest first
pub fn list_decks(conn: &Connection) -> Result<Vec<DeckSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DECK_COLUMNS},
                COUNT(CASE WHEN c.is_archived = 0 THEN 1 END) AS card_count
         FROM decks d
         LEFT JOIN cards c ON d.id = c.deck_id
         WHERE d.is_archived = 0
         GROUP BY d.id
         ORDER BY d.created_at DESC, d.id DESC"
    ))?;

    let decks = stmt
        .query_map([], |row| {
            Ok(DeckSummary {
                deck: deck_from_row(row)?,
                card_count: row.get(8)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(decks)
}

pub fn load_all_decks(conn: &Connection) -> Result<DeckSet> {
    Ok(DeckSet {
        decks: list_decks(conn)?,
    })
}

pub fn find_deck_by_name(name: &str, conn: &Connection) -> Result<Option<Deck>> {
    let deck = conn
        .query_row(
            &format!("SELECT {DECK_COLUMNS} FROM decks d WHERE d.name = ?1 AND d.is_archived = 0"),
            params![name],
            deck_from_row,
        )
        .optional()?;
    Ok(deck)
}

/// Soft-deletes a deck
pub fn archive_deck(deck_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute(
        "UPDATE decks SET is_archived = 1 WHERE id = ?1",
        params![deck_id],
    )?;
    if changed == 0 {
        return Err(Error::deck_not_found(deck_id));
    }
    tracing::info!(deck_id, "deck archived");
    Ok(())
}

const CARD_COLUMNS: &str = "c.id, c.deck_id, c.hanzi, c.english, c.pinyin, c.traditional,
     c.measure_word, c.part_of_speech, c.example_sentence, c.notes, c.base64_audio,
     c.is_archived, c.created_at";

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        deck_id: row.get(1)?,
        content: NewCard {
            hanzi: row.get(2)?,
            english: row.get(3)?,
            pinyin: row.get(4)?,
            traditional: row.get(5)?,
            measure_word: row.get(6)?,
            part_of_speech: row.get(7)?,
            example_sentence: row.get(8)?,
            notes: row.get(9)?,
            base64_audio: row.get(10)?,
        },
        is_archived: row.get(11)?,
        created_at: from_timestamp(row.get(12)?),
    })
}

fn card_with_progress_from_row(row: &Row) -> rusqlite::Result<CardWithProgress> {
    Ok(CardWithProgress {
        card: card_from_row(row)?,
        srs_level: row.get(13)?,
        next_review: row.get::<_, Option<i64>>(14)?.map(from_timestamp),
    })
}

/// Inserts a card and its initial progress on an existing connection or
/// transaction. Callers own atomicity.
pub(crate) fn insert_card(
    deck_id: i64,
    card: &NewCard,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<i64> {
    if card.hanzi.trim().is_empty() || card.english.trim().is_empty() {
        return Err(Error::InvalidInput(
            "hanzi and english are required".to_string(),
        ));
    }

    let deck = get_deck(deck_id, conn)?;
    if deck.is_archived {
        return Err(Error::deck_not_found(deck_id));
    }

    conn.execute(
        "INSERT INTO cards (deck_id, hanzi, english, pinyin, traditional, measure_word,
                            part_of_speech, example_sentence, notes, base64_audio, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            deck_id,
            card.hanzi.trim(),
            card.english.trim(),
            card.pinyin,
            card.traditional,
            card.measure_word,
            card.part_of_speech,
            card.example_sentence,
            card.notes,
            card.base64_audio,
            to_timestamp(now)
        ],
    )?;

    let card_id = conn.last_insert_rowid();
    insert_progress(&CardProgress::new(card_id, deck_id, now), conn)?;

    Ok(card_id)
}

/// Adds a card to a deck and initializes its progress, due immediately.
pub fn add_card(
    deck_id: i64,
    card: &NewCard,
    now: DateTime<Utc>,
    conn: &mut Connection,
) -> Result<i64> {
    let tx = conn.transaction()?;
    let card_id = insert_card(deck_id, card, now, &tx)?;
    tx.commit()?;

    tracing::info!(card_id, deck_id, hanzi = %card.hanzi, "card added");
    Ok(card_id)
}

pub fn get_card(card_id: i64, conn: &Connection) -> Result<Card> {
    conn.query_row(
        &format!("SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = ?1"),
        params![card_id],
        card_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::card_not_found(card_id))
}

/// Soft-deletes a card; its progress row is kept
pub fn archive_card(card_id: i64, conn: &Connection) -> Result<()> {
    let changed = conn.execute(
        "UPDATE cards SET is_archived = 1 WHERE id = ?1",
        params![card_id],
    )?;
    if changed == 0 {
        return Err(Error::card_not_found(card_id));
    }
    tracing::info!(card_id, "card archived");
    Ok(())
}

/// Active cards of a deck with their SRS level and next review, newest first
pub fn cards_for_deck(deck_id: i64, conn: &Connection) -> Result<Vec<CardWithProgress>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS}, cp.srs_level, cp.next_review
         FROM cards c
         LEFT JOIN card_progress cp ON c.id = cp.card_id
         WHERE c.deck_id = ?1 AND c.is_archived = 0
         ORDER BY c.created_at DESC, c.id DESC"
    ))?;

    let cards = stmt
        .query_map(params![deck_id], card_with_progress_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(cards)
}

/// Cards to study now: never scheduled, due, or not yet mastered.
///
/// Weakest cards first, then the most overdue.
pub fn due_cards(
    deck_id: i64,
    now: DateTime<Utc>,
    limit: u32,
    conn: &Connection,
) -> Result<Vec<CardWithProgress>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLUMNS}, cp.srs_level, cp.next_review
         FROM cards c
         LEFT JOIN card_progress cp ON c.id = cp.card_id
         WHERE c.deck_id = ?1 AND c.is_archived = 0
           AND (cp.next_review IS NULL OR cp.next_review <= ?2 OR cp.srs_level < ?3)
         ORDER BY cp.srs_level ASC, cp.next_review ASC, c.id ASC
         LIMIT ?4"
    ))?;

    let cards = stmt
        .query_map(
            params![deck_id, to_timestamp(now), MASTERED_SRS_LEVEL, limit],
            card_with_progress_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(cards)
}

pub fn deck_stats(deck_id: i64, today: NaiveDate, conn: &Connection) -> Result<DeckStats> {
    let cards = cards_for_deck(deck_id, conn)?;
    Ok(calculate_deck_stats(&cards, today))
}

/// Main-screen summary: streak, decks, global mastery and today's count
pub fn dashboard(today: NaiveDate, conn: &Connection) -> Result<Dashboard> {
    let streak: UserStreak = conn.load_streak()?;
    let decks = list_decks(conn)?;

    let total_cards: u32 = conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE is_archived = 0",
        [],
        |row| row.get(0),
    )?;

    let mastered_cards: u32 = conn.query_row(
        "SELECT COUNT(*)
         FROM card_progress cp
         JOIN cards c ON c.id = cp.card_id
         WHERE c.is_archived = 0 AND cp.srs_level >= ?1",
        params![MASTERED_SRS_LEVEL],
        |row| row.get(0),
    )?;

    let studied_today = daily_log(today, conn)?
        .map(|log| log.cards_studied)
        .unwrap_or(0);

    Ok(Dashboard {
        streak,
        decks,
        total_cards,
        mastered_cards,
        mastery_rate: calculate_mastery_rate(mastered_cards, total_cards),
        studied_today,
    })
}
