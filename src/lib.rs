pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod scheduler;

pub use error::{Error, Result};
pub use models::{
    Card, CardProgress, Deck, DeckSet, NewCard, NewDeck, Rating, StudySession, UserStreak,
};
pub use scheduler::{ReviewOutcome, Scheduler};
