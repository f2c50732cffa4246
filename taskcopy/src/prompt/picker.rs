//! Autocomplete picker state.
//!
//! Pure key handling with no terminal attached; the terminal prompter
//! feeds it key events and renders it.

use std::ops::Range;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::search::SearchOption;

/// What the caller should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction {
    /// Nothing changed that needs the outside world.
    None,
    /// The query text changed; submit it to the search.
    QueryChanged(String),
    /// The user accepted this option.
    Submit(SearchOption),
    /// The user aborted.
    Cancel,
}

/// Input line, current options and selection of one picker.
#[derive(Debug, Clone)]
pub struct PickerState {
    input: String,
    options: Vec<SearchOption>,
    selected: usize,
    max_visible: usize,
    pending: bool,
}

impl PickerState {
    /// Empty picker showing at most `max_visible` options at once.
    #[must_use]
    pub fn new(max_visible: usize) -> Self {
        Self {
            input: String::new(),
            options: Vec::new(),
            selected: 0,
            max_visible: max_visible.max(1),
            pending: false,
        }
    }

    /// Current query text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Options for the latest resolved query.
    #[must_use]
    pub fn options(&self) -> &[SearchOption] {
        &self.options
    }

    /// Index of the highlighted option.
    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// Whether results for the current query are still outstanding.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Replaces the options with a fresh result and resets the selection.
    pub fn set_options(&mut self, options: Vec<SearchOption>) {
        self.options = options;
        self.selected = 0;
        self.pending = false;
    }

    /// Indices of the options on screen: a window of at most
    /// `max_visible` that always contains the selection.
    #[must_use]
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.selected.saturating_sub(self.max_visible - 1);
        let end = (start + self.max_visible).min(self.options.len());
        start..end
    }

    /// Applies one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> PickerAction {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => PickerAction::Cancel,
            (KeyCode::Enter, _) => self
                .options
                .get(self.selected)
                .cloned()
                .map_or(PickerAction::None, PickerAction::Submit),
            (KeyCode::Up, _) => {
                self.selected = self.selected.saturating_sub(1);
                PickerAction::None
            }
            (KeyCode::Down, _) => {
                if self.selected + 1 < self.options.len() {
                    self.selected += 1;
                }
                PickerAction::None
            }
            (KeyCode::Backspace, _) => {
                if self.input.pop().is_some() {
                    self.query_changed()
                } else {
                    PickerAction::None
                }
            }
            (KeyCode::Char(c), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.push(c);
                self.query_changed()
            }
            _ => PickerAction::None,
        }
    }

    fn query_changed(&mut self) -> PickerAction {
        self.pending = true;
        PickerAction::QueryChanged(self.input.clone())
    }
}
