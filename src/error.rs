//! Crate-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("rating must be between 1 and 4, got {0}")]
    InvalidRating(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("deck '{0}' already exists")]
    DuplicateDeck(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database connection lock poisoned")]
    ConnectionPoisoned,
}

impl Error {
    pub fn card_not_found(id: i64) -> Self {
        Self::NotFound { entity: "card", id }
    }

    pub fn deck_not_found(id: i64) -> Self {
        Self::NotFound { entity: "deck", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
