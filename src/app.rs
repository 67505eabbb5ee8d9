//! Main application UI.
//! Wordbook management on the main screen and the review session screen.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use word_review::config::AppConfig;
use word_review::database::{SqliteStore, WordSort, WordStore};
use word_review::export::{export_json_to_path, export_tsv_to_path, import_json};
use word_review::models::{
    BatchSize, Boundary, CompletionState, NewWord, RecallStatus, ReviewDesk, SelectionMode, Tally,
    Word,
};
use word_review::SessionError;

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Main,
    Review,
}

/// Review modes offered in the picker. `DueNow` is resolved against the clock at start.
#[derive(Clone, Copy, PartialEq)]
enum ModeChoice {
    Mode(SelectionMode),
    DueNow,
}

impl ModeChoice {
    fn all() -> Vec<ModeChoice> {
        let mut choices: Vec<ModeChoice> = SelectionMode::FIXED.into_iter().map(ModeChoice::Mode).collect();
        choices.push(ModeChoice::DueNow);
        choices
    }

    fn label(self) -> &'static str {
        match self {
            ModeChoice::Mode(mode) => mode.label(),
            ModeChoice::DueNow => "Due now",
        }
    }

    fn resolve(self, now: DateTime<Utc>) -> SelectionMode {
        match self {
            ModeChoice::Mode(mode) => mode,
            ModeChoice::DueNow => SelectionMode::Due { as_of: now },
        }
    }
}

impl From<SelectionMode> for ModeChoice {
    fn from(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Due { .. } => ModeChoice::DueNow,
            other => ModeChoice::Mode(other),
        }
    }
}

pub struct ReviewApp {
    store: SqliteStore,
    desk: ReviewDesk,
    current_screen: AppScreen,

    mode_choice: ModeChoice,
    batch_size: BatchSize,

    new_text: String,
    new_translation: String,
    new_example: String,
    search_term: String,
    sort: WordSort,
    words: Vec<Word>,

    show_translation: bool,
    status_message: String,

    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    show_result_dialog: bool,
    result_message: String,
}

/// Formats a timestamp as a local YYYY-MM-DD string
fn format_date(time: DateTime<Utc>) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d").to_string()
}

fn tally_text(tally: &Tally) -> String {
    format!(
        "{} words: {} recognized, {} fuzzy, {} forgotten",
        tally.total, tally.recognized, tally.fuzzy, tally.forgotten
    )
}

impl eframe::App for ReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
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

        if self.show_result_dialog {
            egui::Window::new("Wordbook")
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

impl ReviewApp {
    pub fn new(store: SqliteStore, config: &AppConfig) -> Self {
        let mut app = Self {
            store,
            desk: ReviewDesk::new(),
            current_screen: AppScreen::Main,
            mode_choice: config.review.default_mode.into(),
            batch_size: config.review.default_count,
            new_text: String::new(),
            new_translation: String::new(),
            new_example: String::new(),
            search_term: String::new(),
            sort: WordSort::default(),
            words: Vec::new(),
            show_translation: false,
            status_message: String::new(),
            show_confirmation_dialog: false,
            allowed_to_close: false,
            show_result_dialog: false,
            result_message: String::new(),
        };
        app.reload_words();
        app
    }

    fn reload_words(&mut self) {
        match self.store.list_words(self.sort, Some(&self.search_term)) {
            Ok(words) => self.words = words,
            Err(e) => {
                tracing::warn!("Failed to load wordbook: {}", e);
                self.status_message = format!("Failed to load wordbook: {}", e);
            }
        }
    }

    fn show_result(&mut self, message: String) {
        self.result_message = message;
        self.show_result_dialog = true;
    }

    /// Renders the main screen with review controls and the wordbook
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let now = Utc::now();
            ui.horizontal(|ui| {
                ui.label(format_date(now));
                ui.separator();
                ui.label(format!(
                    "{} words, {} due",
                    self.store.word_count().unwrap_or_default(),
                    self.store.due_count(now).unwrap_or_default()
                ));
            });
            ui.separator();

            ui.heading("Review");
            let mut action_start = false;
            ui.horizontal(|ui| {
                egui::ComboBox::from_label("Mode")
                    .selected_text(self.mode_choice.label())
                    .show_ui(ui, |ui| {
                        for choice in ModeChoice::all() {
                            ui.selectable_value(&mut self.mode_choice, choice, choice.label());
                        }
                    });
                egui::ComboBox::from_label("Count")
                    .selected_text(self.batch_size.to_string())
                    .show_ui(ui, |ui| {
                        for size in BatchSize::CHOICES {
                            ui.selectable_value(&mut self.batch_size, size, size.to_string());
                        }
                    });
                if ui.button("Start Review").clicked() {
                    action_start = true;
                }
            });
            if matches!(self.desk.completion_state(), CompletionState::EmptyInput) {
                ui.label("No words to review");
            }
            if !self.status_message.is_empty() {
                ui.label(&self.status_message);
            }

            ui.separator();

            ui.heading("Add Word");
            ui.horizontal(|ui| {
                ui.label("Word:");
                ui.text_edit_singleline(&mut self.new_text);
            });
            ui.horizontal(|ui| {
                ui.label("Translation:");
                ui.text_edit_singleline(&mut self.new_translation);
            });
            ui.horizontal(|ui| {
                ui.label("Example:");
                ui.text_edit_singleline(&mut self.new_example);
            });
            let mut action_add = false;
            if ui.button("Add Word").clicked() && !self.new_text.trim().is_empty() {
                action_add = true;
            }

            ui.separator();

            // We store actions to execute after UI rendering to avoid borrowing conflicts
            let mut action_delete: Option<i64> = None;
            let mut action_reload = false;
            let mut action_export_json = false;
            let mut action_export_tsv = false;
            let mut action_import = false;

            ui.heading(format!("Wordbook ({})", self.words.len()));
            ui.horizontal(|ui| {
                ui.label("Search:");
                if ui.text_edit_singleline(&mut self.search_term).changed() {
                    action_reload = true;
                }
                egui::ComboBox::from_label("Sort")
                    .selected_text(match self.sort {
                        WordSort::AddedAt => "Added",
                        WordSort::Text => "Word",
                        WordSort::ReviewCount => "Reviews",
                    })
                    .show_ui(ui, |ui| {
                        action_reload |= ui.selectable_value(&mut self.sort, WordSort::AddedAt, "Added").changed();
                        action_reload |= ui.selectable_value(&mut self.sort, WordSort::Text, "Word").changed();
                        action_reload |= ui
                            .selectable_value(&mut self.sort, WordSort::ReviewCount, "Reviews")
                            .changed();
                    });
            });
            ui.horizontal(|ui| {
                action_export_json = ui.button("Export JSON").clicked();
                action_export_tsv = ui.button("Export Text").clicked();
                action_import = ui.button("Import JSON").clicked();
            });

            egui::ScrollArea::vertical()
                .id_source("wordbook_list")
                .max_height(260.0)
                .show(ui, |ui| {
                    for word in &self.words {
                        ui.group(|ui| {
                            ui.horizontal(|ui| {
                                ui.label(format!("{} ({})", word.text, word.review_count));
                                if ui.small_button("Delete").clicked() {
                                    action_delete = Some(word.id);
                                }
                            });
                            if let Some(translation) = &word.translation {
                                ui.label(format!("   {}", translation));
                            }
                            if let Some(due) = word.next_due_at {
                                ui.label(format!(
                                    "   Next review {} (every {:.1} days)",
                                    format_date(due),
                                    word.review_interval
                                ));
                            }
                        });
                    }
                });

            // Execute deferred actions
            if action_start {
                self.start_review(now);
            }
            if action_add {
                self.add_word(now);
            }
            if let Some(id) = action_delete {
                self.delete_word(id);
            }
            if action_export_json {
                self.handle_export(true);
            }
            if action_export_tsv {
                self.handle_export(false);
            }
            if action_import {
                self.handle_import(now);
            }
            if action_reload {
                self.reload_words();
            }
        });
    }

    /// Renders the review screen for the active session
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = self.desk.session() else {
                self.current_screen = AppScreen::Main;
                return;
            };

            ui.heading(session.phase_message());
            let (position, total) = session.progress();
            ui.label(format!("Word {} / {}", position, total));
            ui.add_space(20.0);

            // Store actions to execute after UI rendering
            let mut action_judge: Option<RecallStatus> = None;
            let mut action_next = false;
            let mut action_previous = false;
            let mut action_restart = false;
            let mut action_decline = false;
            let mut action_back = false;

            match session.completion_state() {
                CompletionState::FullSuccess(tally) => {
                    ui.heading("Congratulations!");
                    ui.label("You recognized every word in this round.");
                    ui.label(tally_text(tally));
                    action_back = ui.button("Back to Main Screen").clicked();
                }
                CompletionState::OfferRestart(tally) => {
                    ui.heading("Round finished");
                    ui.label(tally_text(tally));
                    ui.label(format!(
                        "Review the {} difficult words again?",
                        tally.fuzzy + tally.forgotten
                    ));
                    ui.horizontal(|ui| {
                        action_restart = ui.button("Review difficult words").clicked();
                        action_decline = ui.button("Finish").clicked();
                    });
                }
                CompletionState::Completed(tally) => {
                    ui.heading("Review finished");
                    ui.label(tally_text(tally));
                    action_back = ui.button("Back to Main Screen").clicked();
                }
                state => {
                    if let Some(word) = session.current() {
                        ui.group(|ui| {
                            ui.set_min_height(200.0);
                            ui.vertical_centered(|ui| {
                                ui.add_space(20.0);
                                ui.heading(&word.text);
                                if let Some(phonetic) = &word.phonetic {
                                    ui.label(phonetic);
                                }
                                ui.add_space(20.0);

                                if self.show_translation {
                                    ui.label(word.translation.as_deref().unwrap_or("-"));
                                    if let Some(example) = &word.example {
                                        ui.add_space(10.0);
                                        ui.label(example);
                                    }
                                    if let Some(image) = &word.image_path {
                                        ui.small(format!("Photo: {}", image));
                                    }
                                } else if ui.button("Show Translation").clicked() {
                                    self.show_translation = true;
                                }
                                ui.add_space(20.0);
                            });
                        });

                        ui.add_space(10.0);
                        ui.horizontal(|ui| {
                            for status in RecallStatus::ALL {
                                let label = match status {
                                    RecallStatus::Recognized => "Recognized",
                                    RecallStatus::Fuzzy => "Fuzzy",
                                    RecallStatus::Forgotten => "Forgotten",
                                };
                                if ui.button(label).clicked() {
                                    action_judge = Some(status);
                                }
                            }
                        });
                        ui.horizontal(|ui| {
                            action_previous = ui.button("Previous").clicked();
                            action_next = ui.button("Next").clicked();
                        });
                    }

                    match state {
                        CompletionState::AlreadyAtBoundary(Boundary::First) => {
                            ui.label("Already at the first word");
                        }
                        CompletionState::AlreadyAtBoundary(Boundary::Last) => {
                            ui.label("Already at the last word");
                        }
                        _ => {}
                    }
                    if !self.status_message.is_empty() {
                        ui.label(&self.status_message);
                    }

                    ui.add_space(20.0);
                    action_back = ui.button("Back to Main Screen").clicked();
                }
            }

            // Execute deferred actions
            let Some(session) = self.desk.session_mut() else {
                return;
            };
            if let Some(status) = action_judge {
                match session.record(&self.store, status, Utc::now()) {
                    Ok(_) => {
                        self.show_translation = false;
                        self.status_message.clear();
                    }
                    Err(e) => {
                        tracing::warn!("Failed to record judgment: {}", e);
                        self.status_message = format!("Could not save: {}", e);
                    }
                }
            }
            if action_next {
                session.next();
                self.show_translation = false;
            }
            if action_previous {
                session.previous();
                self.show_translation = false;
            }
            if action_restart {
                if let Err(SessionError::NothingToRestart) = session.accept_restart() {
                    self.status_message = "Nothing to restart".to_string();
                }
                self.show_translation = false;
            }
            if action_decline {
                session.decline_restart();
            }
            if action_back {
                self.desk.discard();
                self.status_message.clear();
                self.current_screen = AppScreen::Main;
                self.reload_words();
            }
        });
    }

    fn start_review(&mut self, now: DateTime<Utc>) {
        let mode = self.mode_choice.resolve(now);
        match self.desk.start(&self.store, mode, self.batch_size) {
            Ok(_) => {
                self.show_translation = false;
                self.status_message.clear();
                self.current_screen = AppScreen::Review;
            }
            Err(SessionError::EmptyBatch) => self.status_message.clear(),
            Err(e) => {
                tracing::warn!("Failed to start review: {}", e);
                self.status_message = format!("Failed to start review: {}", e);
            }
        }
    }

    fn add_word(&mut self, now: DateTime<Utc>) {
        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };
        let word = NewWord {
            text: self.new_text.trim().to_string(),
            translation: optional(&self.new_translation),
            example: optional(&self.new_example),
            ..Default::default()
        };

        match self.store.upsert_word(&word, now) {
            Ok(_) => {
                self.new_text.clear();
                self.new_translation.clear();
                self.new_example.clear();
                self.reload_words();
            }
            Err(e) => self.show_result(format!("Failed to add '{}': {}", word.text, e)),
        }
    }

    fn delete_word(&mut self, id: i64) {
        if let Err(e) = self.store.delete(id) {
            self.show_result(format!("Failed to delete word: {}", e));
        }
        self.reload_words();
    }

    /// Handles wordbook export to a JSON or tab-separated text file
    fn handle_export(&mut self, as_json: bool) {
        let (file_name, filter, extension) = if as_json {
            ("wordbook.json", "JSON files", "json")
        } else {
            ("wordbook.txt", "Text files", "txt")
        };

        // Open file save dialog
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter(filter, &[extension])
            .save_file()
        else {
            return;
        };

        let result = if as_json {
            export_json_to_path(&self.store, &path)
        } else {
            export_tsv_to_path(&self.store, &path)
        };
        match result {
            Ok(count) => self.show_result(format!("Exported {} words to {}", count, path.display())),
            Err(e) => self.show_result(format!("Export failed: {}", e)),
        }
    }

    /// Handles wordbook import from a JSON file
    fn handle_import(&mut self, now: DateTime<Utc>) {
        // Open file selection dialog
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        match import_json(&self.store, &path, now) {
            Ok(summary) => self.show_result(format!(
                "Imported {} new words, updated {}",
                summary.added, summary.updated
            )),
            Err(e) => self.show_result(format!(
                "Import failed: {}\n\nExpected structure:\n{{\n  \"words\": [{{ \"text\": \"...\", \"translation\": \"...\" }}]\n}}",
                e
            )),
        }
        self.reload_words();
    }
}
