//! Container for all active decks, as shown on the main screen
use super::DeckSummary;

#[derive(Clone, Default)]
pub struct DeckSet {
    pub decks: Vec<DeckSummary>,
}

impl DeckSet {
    pub fn position_of(&self, deck_id: i64) -> Option<usize> {
        self.decks.iter().position(|d| d.deck.id == deck_id)
    }
}
