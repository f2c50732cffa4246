//! Prompts on the controlling terminal.
//!
//! The picker renders into a small inline viewport below the cursor and
//! waits on key events and search results at the same time, so the option
//! list refreshes while the user keeps typing. Raw mode is only held for
//! the duration of one prompt.

use std::io::{self, Write};

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures_util::StreamExt;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, Paragraph};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};

use super::picker::{PickerAction, PickerState};
use super::{PromptError, Prompter, theme};
use crate::search::{IncrementalSearch, ProjectSearch, SearchOption};

/// Default number of options shown by the picker.
pub const DEFAULT_MAX_VISIBLE_OPTIONS: usize = 7;

/// [`Prompter`] backed by stdin/stdout.
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    max_visible_options: usize,
}

impl TerminalPrompter {
    /// Creates a prompter whose picker lists at most `max_visible_options`.
    #[must_use]
    pub fn new(max_visible_options: usize) -> Self {
        Self {
            max_visible_options: max_visible_options.max(1),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISIBLE_OPTIONS)
    }
}

/// Restores cooked mode on drop.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl Prompter for TerminalPrompter {
    async fn select<S: ProjectSearch>(
        &mut self,
        message: &str,
        search: &IncrementalSearch<S>,
    ) -> Result<SearchOption, PromptError> {
        let answer = {
            let _raw = RawMode::enable()?;
            let height = u16::try_from(self.max_visible_options + 1).unwrap_or(u16::MAX);
            let mut terminal = Terminal::with_options(
                CrosstermBackend::new(io::stdout()),
                TerminalOptions {
                    viewport: Viewport::Inline(height),
                },
            )?;
            let answer = run_picker(&mut terminal, message, search, self.max_visible_options).await;
            terminal.clear()?;
            answer
        };

        let option = answer?;
        tracing::debug!(prompt = message, choice = %option.id, "option selected");
        writeln!(io::stdout(), "{message}: {}", option.display_name)?;
        Ok(option)
    }

    async fn confirm(&mut self, message: &str) -> Result<bool, PromptError> {
        let mut stdout = io::stdout();
        write!(stdout, "? {message} (y/N) ")?;
        stdout.flush()?;

        let answer = {
            let _raw = RawMode::enable()?;
            read_yes_no(&mut EventStream::new()).await
        };

        match &answer {
            Ok(true) => writeln!(stdout, "yes")?,
            Ok(false) => writeln!(stdout, "no")?,
            Err(_) => writeln!(stdout)?,
        }
        answer
    }
}

async fn run_picker<B: Backend, S: ProjectSearch>(
    terminal: &mut Terminal<B>,
    message: &str,
    search: &IncrementalSearch<S>,
    max_visible: usize,
) -> Result<SearchOption, PromptError> {
    let mut state = PickerState::new(max_visible);
    let mut events = EventStream::new();
    let mut awaiting = false;

    loop {
        terminal.draw(|frame| draw_picker(frame, message, &state))?;

        tokio::select! {
            result = search.latest(), if awaiting => {
                awaiting = false;
                state.set_options(result?);
            }
            event = events.next() => {
                let Some(event) = event else {
                    return Err(PromptError::Cancelled);
                };
                let Event::Key(key) = event? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match state.handle_key(key) {
                    PickerAction::None => {}
                    PickerAction::QueryChanged(query) => {
                        search.submit(&query);
                        awaiting = true;
                    }
                    PickerAction::Submit(option) => return Ok(option),
                    PickerAction::Cancel => return Err(PromptError::Cancelled),
                }
            }
        }
    }
}

async fn read_yes_no(events: &mut EventStream) -> Result<bool, PromptError> {
    while let Some(event) = events.next().await {
        let Event::Key(key) = event? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                return Err(PromptError::Cancelled);
            }
            (KeyCode::Char('y' | 'Y'), _) => return Ok(true),
            (KeyCode::Char('n' | 'N') | KeyCode::Enter, _) => return Ok(false),
            _ => {}
        }
    }
    Err(PromptError::Cancelled)
}

/// Header line `? {message} {input}` followed by the visible options.
fn draw_picker(frame: &mut Frame, message: &str, state: &PickerState) {
    let [header_area, list_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(frame.area());

    let mut header = Line::from(vec![
        Span::styled("? ", theme::marker()),
        Span::styled(message, theme::question()),
        Span::raw(" "),
        Span::raw(state.input()),
    ]);
    let cursor_x = header_area
        .x
        .saturating_add(u16::try_from(header.width()).unwrap_or(u16::MAX));
    if state.is_pending() {
        header.push_span(Span::styled(" ...", theme::dimmed()));
    }
    frame.render_widget(Paragraph::new(header), header_area);

    let range = state.visible_range();
    let items: Vec<ListItem> = if state.options().is_empty() && !state.input().is_empty() {
        if state.is_pending() {
            Vec::new()
        } else {
            vec![ListItem::new("  no matches").style(theme::dimmed())]
        }
    } else {
        state
            .options()
            .iter()
            .enumerate()
            .take(range.end)
            .skip(range.start)
            .map(|(idx, option)| {
                if idx == state.selected() {
                    ListItem::new(format!("> {}", option.display_name)).style(theme::selected())
                } else {
                    ListItem::new(format!("  {}", option.display_name))
                }
            })
            .collect()
    };
    frame.render_widget(List::new(items), list_area);

    frame.set_cursor_position((cursor_x, header_area.y));
}
