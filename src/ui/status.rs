use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Focus, Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let cursor = model.buffer.cursor();
    let dirty = if model.buffer.is_dirty() {
        " [modified]"
    } else {
        ""
    };
    let focus = match model.focus {
        Focus::Editor => "EDIT",
        Focus::Preview => "PREVIEW",
    };
    let stale = if model.preview_is_stale() {
        "  [stale]"
    } else {
        ""
    };
    let watching = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };
    let debounce_ms = model.sync.config().debounce.as_millis();

    let status = format!(
        " {focus}  {}{dirty}  Ln {}, Col {}  [{}%]{stale}{watching}  debounce {debounce_ms}ms  F1:help",
        model.file_name(),
        cursor.line + 1,
        cursor.col + 1,
        model.preview_viewport().scroll_percent(),
    );

    let bg = if model.focus == Focus::Editor {
        Color::Magenta
    } else {
        Color::DarkGray
    };
    let status_bar = Paragraph::new(status).style(Style::default().bg(bg).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let bar = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(bar, area);
}
