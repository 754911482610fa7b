//! Wrapper for cards that tracks progress within one study session.
use super::{Card, Rating};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub card: Card,
    pub is_learned: bool,
    pub last_rating: Option<Rating>,
    pub last_learned_at: Option<DateTime<Utc>>,
}

impl LearningCard {
    pub fn new(card: Card) -> Self {
        Self {
            card,
            is_learned: false,
            last_rating: None,
            last_learned_at: None,
        }
    }

    /// Good and Easy pass the card for this session; Again and Hard queue it again.
    pub fn record(&mut self, rating: Rating, at: DateTime<Utc>) {
        self.last_rating = Some(rating);
        self.is_learned = rating.is_correct();
        if self.is_learned {
            self.last_learned_at = Some(at);
        }
    }
}
