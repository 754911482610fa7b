//! Deck is a named collection of cards
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "Custom";
pub const DEFAULT_COLOR: &str = "#8b5cf6";

/// User-editable deck attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewDeck {
    pub name: String,
    pub description: String,
    pub category: String,
    pub level: Option<String>,
    pub color: String,
}

impl Default for NewDeck {
    fn default() -> Self {
        Self {
            name: "My Deck".to_string(),
            description: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            level: None,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl NewDeck {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    #[serde(flatten)]
    pub details: NewDeck,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Deck {
    pub fn name(&self) -> &str {
        &self.details.name
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckSummary {
    #[serde(flatten)]
    pub deck: Deck,
    pub card_count: u32,
}
