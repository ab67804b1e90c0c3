use std::path::Path;
use chrono::{Duration, NaiveDate, Utc};
use ratatui::widgets::TableState;
use tokio::runtime::Runtime;
use tracing::error;
use crate::ai::AiClient;
use crate::calendar::{shift_weeks, today, week_end, week_start};
use crate::changelog::{basic_changelog, weekly_changelog, Changelog, ChangelogSource};
use crate::commands::{ai_error_message, describe_draft};
use crate::image::ImageData;
use crate::models::{EntryDraft, TaskEntry};
use crate::store::TaskStore;
use crate::weeks::{aggregate_weeks, WeekBucket};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Adding,
    EditingKey,
}

#[derive(PartialEq)]
pub enum Popup {
    None,
    Detail(String),
    Summary,
    AllWeeks,
}

/// Steps of the "New Entry" wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddStep {
    Name,
    RoughImage,
    FinalImage,
    Notes,
}

/// State for the multi-step "New Entry" wizard.
pub struct AddState {
    pub draft: EntryDraft,
    pub step: AddStep,
    pub error: Option<String>,
}

impl AddState {
    fn new(date: NaiveDate) -> Self {
        AddState { draft: EntryDraft::new(date), step: AddStep::Name, error: None }
    }
}

pub struct App {
    pub store: TaskStore,
    pub client: AiClient,
    runtime: Runtime,
    pub week_start: NaiveDate,
    pub selected_date: NaiveDate,
    /// Ids of the selected day's entries, in display order.
    pub day_ids: Vec<String>,
    pub state: TableState,
    pub weeks: Vec<WeekBucket>,
    pub weeks_state: TableState,
    pub popup: Popup,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub add_state: AddState,
    pub summary: Option<Changelog>,
    pub summary_scroll: u16,
    /// Blocking message shown over everything until a key is pressed.
    pub alert: Option<String>,
}

impl App {
    /// Creates a new App on the current week.
    pub fn new(store: TaskStore, client: AiClient, runtime: Runtime) -> App {
        let now = today();
        let mut app = App {
            store,
            client,
            runtime,
            week_start: week_start(now),
            selected_date: now,
            day_ids: Vec::new(),
            state: TableState::default(),
            weeks: Vec::new(),
            weeks_state: TableState::default(),
            popup: Popup::None,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            add_state: AddState::new(now),
            summary: None,
            summary_scroll: 0,
            alert: None,
        };
        app.reload();
        app
    }

    /// Refreshes the selected day's entry list.
    pub fn reload(&mut self) {
        self.day_ids = self.store.for_day(self.selected_date).iter().map(|e| e.id.clone()).collect();
        if self.day_ids.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.day_ids.len() {
                self.state.select(Some(self.day_ids.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn day_entries(&self) -> Vec<&TaskEntry> {
        self.store.for_day(self.selected_date)
    }

    pub fn week_entries(&self) -> Vec<&TaskEntry> {
        self.store.for_week(self.week_start)
    }

    pub fn selected_entry(&self) -> Option<&TaskEntry> {
        let id = self.day_ids.get(self.state.selected()?)?;
        self.store.find(id)
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let (len, state) = match self.popup {
            Popup::AllWeeks => (self.weeks.len(), &mut self.weeks_state),
            _ => (self.day_ids.len(), &mut self.state),
        };
        if len == 0 { return; }
        let i = match state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let (len, state) = match self.popup {
            Popup::AllWeeks => (self.weeks.len(), &mut self.weeks_state),
            _ => (self.day_ids.len(), &mut self.state),
        };
        if len == 0 { return; }
        let i = match state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        state.select(Some(i));
    }

    fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
        self.week_start = week_start(date);
        self.state.select(None);
        self.reload();
    }

    pub fn next_day(&mut self) {
        self.select_date(self.selected_date + Duration::days(1));
    }

    pub fn previous_day(&mut self) {
        self.select_date(self.selected_date - Duration::days(1));
    }

    /// Moves a whole week and selects its Monday.
    pub fn navigate_week(&mut self, direction: i64) {
        self.select_date(shift_weeks(self.week_start, direction));
    }

    pub fn go_to_today(&mut self) {
        self.select_date(today());
    }

    pub fn open_detail(&mut self) {
        if let Some(id) = self.selected_entry().map(|e| e.id.clone()) {
            self.popup = Popup::Detail(id);
        }
    }

    pub fn close_popup(&mut self) {
        self.popup = Popup::None;
    }

    /// Opens the week summary with the basic changelog. Disabled for empty weeks.
    pub fn open_summary(&mut self) {
        if self.week_entries().is_empty() { return; }
        self.show_basic_summary();
        self.popup = Popup::Summary;
    }

    pub fn show_basic_summary(&mut self) {
        let entries = self.week_entries();
        let text = basic_changelog(&entries, self.week_start, week_end(self.week_start));
        self.summary = Some(Changelog { text, source: ChangelogSource::Basic, error: None });
        self.summary_scroll = 0;
    }

    /// Replaces the summary with an AI changelog, falling back to the basic one.
    pub fn generate_ai_summary(&mut self) {
        if !self.client.is_configured() {
            self.alert = Some("Please add your Anthropic API key in settings first (K).".to_string());
            return;
        }
        let entries = self.store.for_week(self.week_start);
        let changelog = self.runtime.block_on(weekly_changelog(
            &self.client,
            &entries,
            self.week_start,
            week_end(self.week_start),
            true,
        ));
        if let Some(err) = &changelog.error {
            self.alert = Some(ai_error_message(err));
        }
        self.summary = Some(changelog);
        self.summary_scroll = 0;
    }

    pub fn scroll_summary(&mut self, delta: i32) {
        self.summary_scroll = (self.summary_scroll as i32 + delta).max(0) as u16;
    }

    pub fn open_weeks(&mut self) {
        self.weeks = aggregate_weeks(self.store.all());
        self.weeks_state.select(if self.weeks.is_empty() { None } else { Some(0) });
        self.popup = Popup::AllWeeks;
    }

    /// Jumps the calendar to the week highlighted in the all-weeks list.
    pub fn jump_to_selected_week(&mut self) {
        if let Some(start) = self.weeks_state.selected().and_then(|i| self.weeks.get(i)).map(|b| b.start) {
            self.select_date(start);
        }
        self.popup = Popup::None;
    }

    /// Initiates the "New Entry" wizard for the selected day.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::new(self.selected_date);
        self.input_buffer.clear();
    }

    /// Initiates editing of the API key.
    pub fn start_edit_key(&mut self) {
        self.input_mode = InputMode::EditingKey;
        self.input_buffer.clear();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::EditingKey => self.handle_key_input(),
            InputMode::Normal => {}
        }
    }

    fn load_image(&mut self) -> Option<ImageData> {
        let path = self.input_buffer.trim().to_string();
        match ImageData::from_path(Path::new(&path)) {
            Ok(image) => {
                self.add_state.error = None;
                Some(image)
            }
            Err(e) => {
                self.add_state.error = Some(e.to_string());
                None
            }
        }
    }

    /// Handles input for the "New Entry" wizard.
    fn handle_adding_input(&mut self) {
        match self.add_state.step {
            AddStep::Name => {
                if !self.input_buffer.trim().is_empty() {
                    self.add_state.draft.name = self.input_buffer.clone();
                    self.add_state.step = AddStep::RoughImage;
                    self.input_buffer.clear();
                }
            }
            AddStep::RoughImage => {
                if self.input_buffer.trim().is_empty() { return; }
                if let Some(image) = self.load_image() {
                    self.add_state.draft.rough_image = Some(image);
                    self.add_state.step = AddStep::FinalImage;
                    self.input_buffer.clear();
                }
            }
            AddStep::FinalImage => {
                if !self.input_buffer.trim().is_empty() {
                    match self.load_image() {
                        Some(image) => self.add_state.draft.final_image = Some(image),
                        None => return,
                    }
                }
                self.add_state.step = AddStep::Notes;
                self.input_buffer.clear();
            }
            AddStep::Notes => {
                self.add_state.draft.notes = self.input_buffer.clone();
                self.finish_add();
            }
        }
    }

    fn finish_add(&mut self) {
        let draft = self.add_state.draft.clone();
        let Some(entry) = draft.into_entry(Utc::now()) else { return; };
        if let Err(e) = self.store.append(entry) {
            error!("saving entry failed: {}", e);
            self.alert = Some(format!("Failed to save entry: {}", e));
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.reload();
    }

    /// Asks the AI service to describe (or compare) the draft's images.
    ///
    /// Only available on the notes step, once a rough image is loaded.
    pub fn describe_with_ai(&mut self) {
        if self.input_mode != InputMode::Adding || self.add_state.step != AddStep::Notes {
            return;
        }
        if !self.client.is_configured() {
            self.alert = Some("Please add your Anthropic API key in settings first (K).".to_string());
            return;
        }
        self.add_state.draft.notes = self.input_buffer.clone();
        let result = self.runtime.block_on(describe_draft(&self.client, &mut self.add_state.draft));
        match result {
            Ok(()) => self.input_buffer = self.add_state.draft.notes.clone(),
            Err(e) => self.alert = Some(ai_error_message(&e)),
        }
    }

    /// Saves the typed key. An empty input just closes the form; clearing is `clear_key`.
    fn handle_key_input(&mut self) {
        let key = self.input_buffer.trim().to_string();
        if key.is_empty() {
            self.cancel_input();
            return;
        }
        if let Err(e) = self.client.credentials_mut().set(&key) {
            self.alert = Some(format!("Failed to save API key: {}", e));
        }
        self.cancel_input();
    }

    pub fn clear_key(&mut self) {
        if let Err(e) = self.client.credentials_mut().clear() {
            self.alert = Some(format!("Failed to clear API key: {}", e));
        }
        self.cancel_input();
    }
}
