//! Mastery and due-count statistics for decks and the dashboard.
use super::card_progress::MASTERED_SRS_LEVEL;
use super::{CardWithProgress, DeckSummary, UserStreak};
use chrono::NaiveDate;
use serde::Serialize;

/// Percentage of mastered cards, rounded to one decimal. 0 for an empty set.
pub fn calculate_mastery_rate(mastered_cards: u32, total_cards: u32) -> f64 {
    if total_cards == 0 {
        return 0.0;
    }
    let rate = f64::from(mastered_cards) / f64::from(total_cards) * 100.0;
    (rate * 10.0).round() / 10.0
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeckStats {
    pub card_count: u32,
    pub due_count: u32,
    pub mastery_rate: f64,
}

/// A card is due when its next review falls on or before `today`.
pub fn calculate_deck_stats(cards: &[CardWithProgress], today: NaiveDate) -> DeckStats {
    let card_count = cards.len() as u32;
    let due_count = cards
        .iter()
        .filter(|c| c.next_review.is_some_and(|next| next.date_naive() <= today))
        .count() as u32;
    let mastered_count = cards
        .iter()
        .filter(|c| c.srs_level.is_some_and(|level| level >= MASTERED_SRS_LEVEL))
        .count() as u32;

    DeckStats {
        card_count,
        due_count,
        mastery_rate: calculate_mastery_rate(mastered_count, card_count),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dashboard {
    pub streak: UserStreak,
    pub decks: Vec<DeckSummary>,
    pub total_cards: u32,
    pub mastered_cards: u32,
    pub mastery_rate: f64,
    pub studied_today: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Card, NewCard};
    use chrono::{TimeZone, Utc};

    fn card(srs_level: Option<u32>, next_review_day: Option<u32>) -> CardWithProgress {
        CardWithProgress {
            card: Card {
                id: 1,
                deck_id: 1,
                content: NewCard::new("书", "book"),
                is_archived: false,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            },
            srs_level,
            next_review: next_review_day
                .map(|d| Utc.with_ymd_and_hms(2024, 1, d, 18, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_mastery_rate_rounding() {
        assert_eq!(calculate_mastery_rate(0, 0), 0.0);
        assert_eq!(calculate_mastery_rate(1, 3), 33.3);
        assert_eq!(calculate_mastery_rate(2, 3), 66.7);
        assert_eq!(calculate_mastery_rate(5, 5), 100.0);
    }

    #[test]
    fn test_deck_stats() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let cards = vec![
            card(Some(0), Some(10)),
            card(Some(3), Some(20)),
            card(Some(5), Some(2)),
            card(None, None),
        ];

        let stats = calculate_deck_stats(&cards, today);
        assert_eq!(stats.card_count, 4);
        assert_eq!(stats.due_count, 2);
        assert_eq!(stats.mastery_rate, 50.0);
    }

    #[test]
    fn test_empty_deck_stats() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let stats = calculate_deck_stats(&[], today);
        assert_eq!(stats.card_count, 0);
        assert_eq!(stats.mastery_rate, 0.0);
    }
}
