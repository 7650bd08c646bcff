//! Terminal UI components.
//!
//! This module contains all UI-related code including:
//! - [`viewport`]: Scroll position and visible range management
//! - [`style`]: Theming and colors
//! - [`render`]: The split editor/preview screen

pub mod style;
pub mod viewport;

mod overlays;
mod render;
mod status;

use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub use render::{line_number_width, render};

/// Rows below the panes: status bar and toast line.
pub const FOOTER_ROWS: u16 = 2;
/// Horizontal padding inside the preview border, per side.
pub const PREVIEW_PADDING: u16 = 1;
pub const EDITOR_WIDTH_PERCENT: u16 = 50;
pub const PREVIEW_WIDTH_PERCENT: u16 = 50;

/// Screen areas, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub panes: Rect,
    pub status: Rect,
    pub toast: Rect,
}

pub fn split_screen(area: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    ScreenLayout {
        panes: rows[0],
        status: rows[1],
        toast: rows[2],
    }
}

/// Editor on the left, preview on the right.
pub fn split_panes(area: Rect) -> (Rect, Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(PREVIEW_WIDTH_PERCENT),
        ])
        .split(area);
    (columns[0], columns[1])
}

/// Text columns available inside the preview pane for a terminal this wide.
pub fn preview_content_width(terminal_width: u16) -> u16 {
    let (_, preview) = split_panes(Rect::new(0, 0, terminal_width, 1));
    preview
        .width
        .saturating_sub(2 + 2 * PREVIEW_PADDING)
        .max(1)
}

/// Text rows available inside either pane for a terminal this tall.
pub const fn pane_content_height(terminal_height: u16) -> u16 {
    let rows = terminal_height.saturating_sub(FOOTER_ROWS + 2);
    if rows == 0 { 1 } else { rows }
}

#[cfg(test)]
mod tests;
