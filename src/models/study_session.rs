//! Study session management for spaced repetition practice.
//! Handles multi-round review of a deck's due cards, rating each through the scheduler.

use super::{CardWithProgress, LearningCard, Rating};
use crate::clock::Clock;
use crate::database::review;
use crate::error::{Error, Result};
use crate::scheduler::{ReviewOutcome, Scheduler};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Manages a study session with multiple review rounds.
/// Cards rated Again or Hard are repeated in subsequent rounds.
pub struct StudySession {
    pub deck_id: i64,
    pub deck_name: String,
    pub all_cards: Vec<LearningCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_answer: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub round_number: usize,
}

impl StudySession {
    /// Creates a new session from cards selected by `due_cards`.
    pub fn new_from_due_cards(
        deck_id: i64,
        deck_name: String,
        cards: Vec<CardWithProgress>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        let all_cards: Vec<_> = cards
            .into_iter()
            .map(|c| LearningCard::new(c.card))
            .collect();

        let indices: Vec<usize> = (0..all_cards.len()).collect();

        Self {
            deck_id,
            deck_name,
            all_cards,
            current_round_cards: indices,
            current_index: 0,
            show_answer: false,
            conn,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn toggle_answer(&mut self) {
        self.show_answer = !self.show_answer;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_answer = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that did not pass.
    /// If none remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.all_cards.get(idx).is_some_and(|card| !card.is_learned))
            .collect();

        if failed_indices.is_empty() {
            return;
        }

        self.current_round_cards = failed_indices;
        self.current_index = 0;
        self.show_answer = false;
        self.round_number += 1;
        tracing::debug!(
            round = self.round_number,
            cards = self.current_round_cards.len(),
            "starting next study round"
        );
    }

    /// Rates the current card through the scheduler and records the result
    /// for this session. Does not advance; call [`Self::next_card`] after.
    pub fn rate_current_card<C: Clock>(
        &mut self,
        rating: Rating,
        scheduler: &Scheduler<C>,
    ) -> Result<ReviewOutcome> {
        let idx = *self
            .current_round_cards
            .get(self.current_index)
            .ok_or_else(|| Error::InvalidInput("no card to rate".to_string()))?;

        let card_id = self.all_cards[idx].card.id;
        let outcome = {
            let mut conn = self.conn.lock().map_err(|_| Error::ConnectionPoisoned)?;
            review::rate_card(&mut conn, scheduler, card_id, rating.value())?
        };

        self.all_cards[idx].record(rating, scheduler.clock().now());
        Ok(outcome)
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.all_cards.get(idx).is_some_and(|card| card.is_learned))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// True when the round is empty or every card in it has passed.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
