pub mod card;
pub mod card_progress;
pub mod deck;
pub mod deck_set;
pub mod learning_card;
pub mod rating;
pub mod sm2;
pub mod stats;
pub mod streak;
pub mod study_session;

pub use card::{Card, CardWithProgress, NewCard};
pub use card_progress::{
    CardProgress, DEFAULT_EASE_FACTOR, MASTERED_SRS_LEVEL, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR,
};
pub use deck::{Deck, DeckSummary, NewDeck};
pub use deck_set::DeckSet;
pub use learning_card::LearningCard;
pub use rating::Rating;
pub use stats::{Dashboard, DeckStats};
pub use streak::{DailyStudyLog, UserStreak};
pub use study_session::StudySession;
