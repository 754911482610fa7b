//! Main application UI and state management.
//! Handles the deck/card screen and study sessions; scheduling and storage
//! live in the library.

use crate::clock::{Clock, SimulatedClock};
use crate::config::Config;
use crate::database::db;
use crate::error::{Error, Result};
use crate::export::json::{export_deck, export_json_to_path, import_deck, import_json};
use crate::models::{CardWithProgress, DeckSet, DeckStats, NewCard, NewDeck, Rating, StudySession};
use crate::models::stats::Dashboard;
use crate::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use eframe::egui;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Study,
}

/// Main application state
pub struct MyApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    all_decks: DeckSet,
    selected_deck_index: Option<usize>,
    selected_cards: Vec<CardWithProgress>,
    selected_stats: Option<DeckStats>,
    new_card: NewCard,
    new_deck_name: String,
    new_deck_category: String,
    conn: Arc<Mutex<Connection>>,
    config: Config,
    scheduler: Scheduler<SimulatedClock>,
    dashboard: Option<Dashboard>,

    current_screen: AppScreen,
    study_session: Option<StudySession>,
    last_review_message: String,

    show_export_dialog: bool,
    show_result_dialog: bool,
    result_message: String,
}

const IMPORT_FORMAT_HINT: &str = r#"{
  "name": "Deck Name",
  "cards": [{ "hanzi": "...", "english": "..." }]
}"#;

fn format_date(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Study => self.render_study_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_export_dialog {
            let mut export_deck_index: Option<usize> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();

                    for (i, summary) in self.all_decks.decks.iter().enumerate() {
                        if ui
                            .button(format!(
                                "{} ({} cards)",
                                summary.deck.name(),
                                summary.card_count
                            ))
                            .clicked()
                        {
                            export_deck_index = Some(i);
                        }
                    }

                    ui.separator();

                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(i) = export_deck_index {
                self.handle_export(i);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_result_dialog {
            egui::Window::new("Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl MyApp {
    /// Creates a new application instance with decks loaded from the database
    pub fn new_with_deckset(deckset: DeckSet, conn: Connection, config: Config) -> Self {
        let offset = db::day_offset(&conn).unwrap_or(0);
        let has_decks = !deckset.decks.is_empty();
        let mut app = Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            all_decks: deckset,
            selected_deck_index: if has_decks { Some(0) } else { None },
            selected_cards: Vec::new(),
            selected_stats: None,
            new_card: NewCard::default(),
            new_deck_name: String::new(),
            new_deck_category: String::new(),
            conn: Arc::new(Mutex::new(conn)),
            scheduler: Scheduler::new(SimulatedClock::new(offset), config.daily_goal),
            config,
            dashboard: None,
            current_screen: AppScreen::Main,
            study_session: None,
            last_review_message: String::new(),
            show_export_dialog: false,
            show_result_dialog: false,
            result_message: String::new(),
        };
        app.refresh();
        app
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut guard = self.conn.lock().map_err(|_| Error::ConnectionPoisoned)?;
        f(&mut *guard)
    }

    fn show_result(&mut self, message: String) {
        self.result_message = message;
        self.show_result_dialog = true;
    }

    fn show_error(&mut self, context: &str, err: Error) {
        tracing::error!(error = %err, "{context}");
        self.show_result(format!("{context}: {err}"));
    }

    /// Reloads decks, dashboard and the selected deck's cards
    fn refresh(&mut self) {
        let today = self.scheduler.clock().today();
        let selected_id = self
            .selected_deck_index
            .and_then(|i| self.all_decks.decks.get(i))
            .map(|d| d.deck.id);

        let loaded = self.with_conn(|conn| {
            let decks = db::load_all_decks(conn)?;
            let dashboard = db::dashboard(today, conn)?;
            Ok((decks, dashboard))
        });

        match loaded {
            Ok((decks, dashboard)) => {
                self.all_decks = decks;
                self.dashboard = Some(dashboard);
            }
            Err(err) => {
                self.show_error("Failed to load decks", err);
                return;
            }
        }

        self.selected_deck_index = selected_id
            .and_then(|id| self.all_decks.position_of(id))
            .or(if self.all_decks.decks.is_empty() { None } else { Some(0) });

        self.refresh_selected_deck();
    }

    fn refresh_selected_deck(&mut self) {
        let today = self.scheduler.clock().today();
        let Some(deck_id) = self
            .selected_deck_index
            .and_then(|i| self.all_decks.decks.get(i))
            .map(|d| d.deck.id)
        else {
            self.selected_cards.clear();
            self.selected_stats = None;
            return;
        };

        let loaded = self.with_conn(|conn| {
            let cards = db::cards_for_deck(deck_id, conn)?;
            let stats = db::deck_stats(deck_id, today, conn)?;
            Ok((cards, stats))
        });

        match loaded {
            Ok((cards, stats)) => {
                self.selected_cards = cards;
                self.selected_stats = Some(stats);
            }
            Err(err) => self.show_error("Failed to load cards", err),
        }
    }

    /// Renders the main screen with deck and card management
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        let mut action_next_day = false;
        let mut action_create_deck = false;
        let mut action_import = false;
        let mut action_select: Option<usize> = None;
        let mut action_learn: Option<usize> = None;
        let mut action_add_card = false;
        let mut action_archive_card: Option<i64> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format_date(self.scheduler.clock().now()));
                if ui.button("Next Day").clicked() {
                    action_next_day = true;
                }
            });

            if let Some(dashboard) = &self.dashboard {
                ui.label(format!(
                    "Streak: {} days (best {}, {} study days total)",
                    dashboard.streak.current_streak,
                    dashboard.streak.longest_streak,
                    dashboard.streak.total_streak_days
                ));
                ui.label(format!(
                    "Studied today: {}   Cards: {}   Mastery: {}%",
                    dashboard.studied_today, dashboard.total_cards, dashboard.mastery_rate
                ));
            }
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    action_import = true;
                }
            });

            ui.separator();

            ui.heading("Create New Deck");
            ui.horizontal(|ui| {
                ui.label("Name:");
                ui.text_edit_singleline(&mut self.new_deck_name);
            });
            ui.horizontal(|ui| {
                ui.label("Category:");
                ui.text_edit_singleline(&mut self.new_deck_category);
                if ui.button("Create Deck").clicked() {
                    action_create_deck = true;
                }
            });

            ui.separator();

            ui.heading(format!("Decks ({})", self.all_decks.decks.len()));

            egui::ScrollArea::vertical()
                .id_source("decks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for (i, summary) in self.all_decks.decks.iter().enumerate() {
                        let is_selected = self.selected_deck_index == Some(i);

                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!(
                                        "{}. {} [{}] ({} cards)",
                                        i + 1,
                                        summary.deck.name(),
                                        summary.deck.details.category,
                                        summary.card_count
                                    ),
                                )
                                .clicked()
                            {
                                action_select = Some(i);
                            }

                            if ui.button("Study").clicked() {
                                action_learn = Some(i);
                            }
                        });
                    }
                });

            ui.separator();

            let Some(summary) = self
                .selected_deck_index
                .and_then(|i| self.all_decks.decks.get(i))
            else {
                ui.label("Select a deck to add cards");
                return;
            };

            ui.heading(format!("Selected Deck: {}", summary.deck.name()));
            if let Some(stats) = &self.selected_stats {
                ui.label(format!(
                    "{} cards, {} due, {}% mastered",
                    stats.card_count, stats.due_count, stats.mastery_rate
                ));
            }

            ui.horizontal(|ui| {
                ui.label("Hanzi:");
                ui.text_edit_singleline(&mut self.new_card.hanzi);
            });
            ui.horizontal(|ui| {
                ui.label("Pinyin:");
                ui.text_edit_singleline(&mut self.new_card.pinyin);
            });
            ui.horizontal(|ui| {
                ui.label("English:");
                ui.text_edit_singleline(&mut self.new_card.english);
            });
            ui.horizontal(|ui| {
                ui.label("Example:");
                ui.text_edit_singleline(&mut self.new_card.example_sentence);
            });
            if ui.button("Add Card").clicked() {
                action_add_card = true;
            }

            ui.separator();

            ui.heading(format!("Cards ({})", self.selected_cards.len()));

            egui::ScrollArea::vertical()
                .id_source("cards_list")
                .max_height(220.0)
                .show(ui, |ui| {
                    for (i, entry) in self.selected_cards.iter().enumerate() {
                        ui.group(|ui| {
                            ui.horizontal(|ui| {
                                ui.label(format!(
                                    "{}. {} {} = {}",
                                    i + 1,
                                    entry.card.content.hanzi,
                                    entry.card.content.pinyin,
                                    entry.card.content.english
                                ));
                                if ui.small_button("Archive").clicked() {
                                    action_archive_card = Some(entry.card.id);
                                }
                            });
                            ui.small(format!(
                                "SRS level {} | next review {}",
                                entry.srs_level.unwrap_or(0),
                                entry
                                    .next_review
                                    .map(format_date)
                                    .unwrap_or_else(|| "now".to_string())
                            ));
                        });
                    }
                });
        });

        // Execute deferred actions
        if action_next_day {
            self.handle_next_day();
        }
        if action_import {
            self.handle_import();
        }
        if action_create_deck {
            self.handle_create_deck();
        }
        if let Some(i) = action_select {
            self.selected_deck_index = Some(i);
            self.refresh_selected_deck();
        }
        if action_add_card {
            self.handle_add_card();
        }
        if let Some(card_id) = action_archive_card {
            match self.with_conn(|conn| db::archive_card(card_id, conn)) {
                Ok(()) => self.refresh(),
                Err(err) => self.show_error("Failed to archive card", err),
            }
        }
        if let Some(i) = action_learn {
            self.start_study_session(i);
        }
    }

    /// Renders the study screen with the card review interface
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        let mut action_toggle_answer = false;
        let mut action_rate: Option<Rating> = None;
        let mut action_back = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &self.study_session else {
                action_back = true;
                return;
            };

            ui.heading(format!("Studying: {}", session.deck_name));
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} passed ({} remaining)",
                session.learned_count(),
                session.total_count(),
                session.remaining_count()
            ));
            if !self.last_review_message.is_empty() {
                ui.small(&self.last_review_message);
            }

            ui.add_space(20.0);

            if session.is_completed() {
                ui.heading("Well done!");
                ui.label("Every card in this session has been passed.");
                ui.add_space(20.0);
                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
                return;
            }

            let Some(current) = session.current_card() else {
                action_back = true;
                return;
            };
            let content = &current.card.content;

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.label(egui::RichText::new(&content.hanzi).size(48.0));
                    ui.add_space(20.0);

                    if session.show_answer {
                        ui.heading(&content.pinyin);
                        ui.label(&content.english);
                        if !content.example_sentence.is_empty() {
                            ui.add_space(10.0);
                            ui.label(&content.example_sentence);
                        }
                        if !content.notes.is_empty() {
                            ui.small(&content.notes);
                        }
                    } else {
                        ui.label("(Click 'Show Answer' to reveal)");
                    }

                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            if !session.show_answer {
                if ui.button("Show Answer").clicked() {
                    action_toggle_answer = true;
                }
            } else {
                ui.label("How well did you remember it?");
                ui.horizontal(|ui| {
                    for rating in Rating::ALL {
                        if ui.button(rating.label()).clicked() {
                            action_rate = Some(rating);
                        }
                    }
                });
            }

            ui.add_space(20.0);

            if ui.button("Back to Main Screen").clicked() {
                action_back = true;
            }
        });

        // Execute deferred actions
        if action_toggle_answer {
            if let Some(session) = &mut self.study_session {
                session.toggle_answer();
            }
        }
        if let Some(rating) = action_rate {
            self.handle_rating(rating);
        }
        if action_back {
            self.current_screen = AppScreen::Main;
            self.study_session = None;
            self.last_review_message.clear();
            self.refresh();
        }
    }

    fn handle_rating(&mut self, rating: Rating) {
        let Some(session) = &mut self.study_session else {
            return;
        };

        match session.rate_current_card(rating, &self.scheduler) {
            Ok(outcome) => {
                self.last_review_message = format!(
                    "{}: next review in {} day(s), ease {:.2}",
                    outcome.rating.label(),
                    outcome.interval_days,
                    outcome.ease_factor
                );
                session.next_card();
            }
            Err(err) => self.show_error("Failed to save rating", err),
        }
    }

    fn handle_next_day(&mut self) {
        match self.with_conn(|conn| db::advance_day(conn)) {
            Ok(offset) => {
                self.scheduler =
                    Scheduler::new(SimulatedClock::new(offset), self.config.daily_goal);
                self.refresh();
            }
            Err(err) => self.show_error("Failed to advance day", err),
        }
    }

    fn handle_create_deck(&mut self) {
        let category = self.new_deck_category.trim();
        let deck = NewDeck {
            category: if category.is_empty() {
                NewDeck::default().category
            } else {
                category.to_string()
            },
            ..NewDeck::named(&self.new_deck_name)
        };
        let now = self.scheduler.clock().now();

        match self.with_conn(|conn| db::create_deck(&deck, now, conn)) {
            Ok(deck_id) => {
                self.new_deck_name.clear();
                self.new_deck_category.clear();
                self.refresh();
                self.selected_deck_index = self.all_decks.position_of(deck_id);
                self.refresh_selected_deck();
            }
            Err(err) => self.show_error("Failed to create deck", err),
        }
    }

    fn handle_add_card(&mut self) {
        let Some(deck_id) = self
            .selected_deck_index
            .and_then(|i| self.all_decks.decks.get(i))
            .map(|d| d.deck.id)
        else {
            return;
        };
        let card = self.new_card.clone();
        let now = self.scheduler.clock().now();

        match self.with_conn(|conn| db::add_card(deck_id, &card, now, conn)) {
            Ok(_) => {
                self.new_card = NewCard::default();
                self.refresh();
            }
            Err(err) => self.show_error("Failed to add card", err),
        }
    }

    /// Starts a study session with the deck's due and unmastered cards
    fn start_study_session(&mut self, deck_index: usize) {
        let Some(summary) = self.all_decks.decks.get(deck_index) else {
            return;
        };
        let deck_id = summary.deck.id;
        let deck_name = summary.deck.name().to_string();
        let now = self.scheduler.clock().now();
        let limit = self.config.study_batch_size;

        match self.with_conn(|conn| db::due_cards(deck_id, now, limit, conn)) {
            Ok(cards) if cards.is_empty() => {
                self.show_result(format!("Nothing to study in '{deck_name}' right now."));
            }
            Ok(cards) => {
                tracing::info!(deck_id, cards = cards.len(), "study session started");
                self.study_session = Some(StudySession::new_from_due_cards(
                    deck_id,
                    deck_name,
                    cards,
                    Arc::clone(&self.conn),
                ));
                self.current_screen = AppScreen::Study;
            }
            Err(err) => self.show_error("Failed to load due cards", err),
        }
    }

    /// Handles deck export to a JSON file
    fn handle_export(&mut self, deck_index: usize) {
        self.show_export_dialog = false;
        let Some(summary) = self.all_decks.decks.get(deck_index) else {
            return;
        };
        let deck_id = summary.deck.id;
        let deck_name = summary.deck.name().to_string();

        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{deck_name}.json"))
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let result = self
            .with_conn(|conn| export_deck(deck_id, conn))
            .and_then(|export| export_json_to_path(&export, &path));

        match result {
            Ok(()) => self.show_result(format!("Deck '{deck_name}' exported successfully!")),
            Err(err) => self.show_error("Export failed", err),
        }
    }

    /// Handles deck import from a JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let export = match import_json(&path) {
            Ok(export) => export,
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "import failed");
                self.show_result(format!(
                    "Import failed: {err}\n\n\
                     Please check if the file has correct structure:\n{IMPORT_FORMAT_HINT}"
                ));
                return;
            }
        };

        let now = self.scheduler.clock().now();
        match self.with_conn(|conn| import_deck(&export, now, conn)) {
            Ok(_) => {
                self.refresh();
                self.show_result(format!(
                    "Deck '{}' imported successfully with {} cards!",
                    export.deck.name,
                    export.cards.len()
                ));
            }
            Err(Error::DuplicateDeck(name)) => self.show_result(format!(
                "Deck '{name}' already exists! Please rename it in the JSON file."
            )),
            Err(err) => self.show_error("Import failed", err),
        }
    }
}
