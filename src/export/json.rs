//! JSON import/export module for decks.
//! Saves a deck and its cards' content to a JSON file and loads it back.
//! Review progress is not exported; imported cards start fresh.

use crate::database::db::{self, cards_for_deck, find_deck_by_name, get_deck};
use crate::error::{Error, Result};
use crate::models::{NewCard, NewDeck};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckExport {
    #[serde(flatten)]
    pub deck: NewDeck,
    #[serde(default)]
    pub cards: Vec<NewCard>,
}

/// Collects a deck's details and its active cards, oldest card first.
pub fn export_deck(deck_id: i64, conn: &Connection) -> Result<DeckExport> {
    let deck = get_deck(deck_id, conn)?;
    let mut cards: Vec<NewCard> = cards_for_deck(deck_id, conn)?
        .into_iter()
        .map(|c| c.card.content)
        .collect();
    cards.reverse();

    Ok(DeckExport {
        deck: deck.details,
        cards,
    })
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_json_to_path(export: &DeckExport, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(export)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;

    tracing::info!(
        deck = %export.deck.name,
        path = %path.display(),
        cards = export.cards.len(),
        "deck exported"
    );
    Ok(())
}

/// Reads a deck export from a JSON file.
pub fn import_json(path: &Path) -> Result<DeckExport> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let export: DeckExport = serde_json::from_str(&contents)?;
    Ok(export)
}

/// Creates the deck and all its cards in one transaction.
///
/// Fails with [`Error::DuplicateDeck`] if an active deck already has the name.
pub fn import_deck(export: &DeckExport, now: DateTime<Utc>, conn: &mut Connection) -> Result<i64> {
    let name = export.deck.name.trim();
    if find_deck_by_name(name, conn)?.is_some() {
        return Err(Error::DuplicateDeck(name.to_string()));
    }

    let tx = conn.transaction()?;
    let deck_id = db::create_deck(&export.deck, now, &tx)?;
    for card in &export.cards {
        db::insert_card(deck_id, card, now, &tx)?;
    }
    tx.commit()?;

    tracing::info!(deck_id, deck = %name, cards = export.cards.len(), "deck imported");
    Ok(deck_id)
}
