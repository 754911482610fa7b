mod app;
use hanzi_flashcards::*;

use app::MyApp;
use clock::{Clock, SystemClock};
use config::Config;
use database::db::{create_deck, list_decks, load_all_decks, open_database};
use rusqlite::Connection;

fn seed_sample_deck(conn: &mut Connection) -> Result<()> {
    let now = SystemClock.now();
    let deck_id = create_deck(
        &NewDeck {
            description: "Everyday greetings".to_string(),
            level: Some("HSK 1".to_string()),
            ..NewDeck::named("Chinese Basics")
        },
        now,
        conn,
    )?;

    for (hanzi, pinyin, english) in [
        ("你好", "nǐ hǎo", "hello"),
        ("谢谢", "xiè xie", "thank you"),
        ("请", "qǐng", "please"),
    ] {
        database::db::add_card(
            deck_id,
            &NewCard::new(hanzi, english).with_pinyin(pinyin),
            now,
            conn,
        )?;
    }

    Ok(())
}

/// Seeds the sample deck into a database with no decks. Returns whether it did.
fn seed_if_empty(conn: &mut Connection) -> Result<bool> {
    if !list_decks(conn)?.is_empty() {
        return Ok(false);
    }
    seed_sample_deck(conn)?;
    Ok(true)
}

fn main() -> eframe::Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    logging::init_tracing(&config.log_level);

    let mut conn = match open_database(&config.database_path) {
        Ok(conn) => conn,
        Err(err) => {
            tracing::error!(
                error = %err,
                path = %config.database_path.display(),
                "failed to open database"
            );
            std::process::exit(1);
        }
    };

    match seed_if_empty(&mut conn) {
        Ok(true) => tracing::info!("sample deck created"),
        Ok(false) => {}
        Err(err) => tracing::warn!(error = %err, "failed to create sample deck"),
    }

    let deck_set = load_all_decks(&conn).unwrap_or_else(|err| {
        tracing::error!(error = %err, "failed to load decks");
        DeckSet::default()
    });

    tracing::info!(decks = deck_set.decks.len(), "decks loaded");
    for summary in &deck_set.decks {
        tracing::debug!(deck = summary.deck.name(), cards = summary.card_count, "deck");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Hanzi Flashcards",
        options,
        Box::new(|_cc| Ok(Box::new(MyApp::new_with_deckset(deck_set, conn, config)))),
    )
}
