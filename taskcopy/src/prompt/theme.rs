//! Styles for the prompts.

use ratatui::style::{Color, Modifier, Style};

/// Marker in front of a question.
pub const MARKER: Color = Color::Green;

/// Highlighted option.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Secondary text (hints, pending indicator).
pub const FG_SECONDARY: Color = Color::Gray;

/// Question text.
#[must_use]
pub fn question() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// The `?` marker.
#[must_use]
pub fn marker() -> Style {
    Style::default().fg(MARKER).add_modifier(Modifier::BOLD)
}

/// Highlighted option row.
#[must_use]
pub fn selected() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Dimmed text.
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}
