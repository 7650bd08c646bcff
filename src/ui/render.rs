use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::{Focus, Model};

use super::{PREVIEW_PADDING, overlays, split_panes, split_screen, status, style};

const FOCUSED_BORDER: Color = Color::Yellow;
const UNFOCUSED_BORDER: Color = Color::DarkGray;

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let screen = split_screen(area);
    let (editor_area, preview_area) = split_panes(screen.panes);

    render_editor(model, frame, editor_area);
    render_preview(model, frame, preview_area);

    status::render_status_bar(model, frame, screen.status);
    status::render_toast_bar(model, frame, screen.toast);

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn pane_block(title: Line<'static>, focused: bool) -> Block<'static> {
    let border = if focused {
        FOCUSED_BORDER
    } else {
        UNFOCUSED_BORDER
    };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus == Focus::Editor;
    let block = pane_block(Line::from(" Editor "), focused);
    let inner = block.inner(area);

    let buf = &model.buffer;
    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines) as usize;

    let start = model.editor_scroll_offset;
    let end = (start + inner.height as usize).min(total_lines);
    let cursor = buf.cursor();

    let mut content: Vec<Line> = Vec::with_capacity(end.saturating_sub(start));
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default();
        let line_num = format!("{:>gutter_width$} ", line_idx + 1);
        let mut spans = vec![Span::styled(line_num, Style::default().fg(Color::DarkGray))];

        if focused && line_idx == cursor.line {
            spans.extend(cursor_line_spans(&line_text, cursor.col));
        } else {
            spans.push(Span::raw(line_text));
        }
        content.push(Line::from(spans));
    }

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Split a line around the cursor so the cursor cell can be highlighted.
///
/// `col` counts characters, not bytes.
fn cursor_line_spans(line: &str, col: usize) -> Vec<Span<'static>> {
    let split = line.char_indices().nth(col).map_or(line.len(), |(i, _)| i);
    let (before, rest) = line.split_at(split);
    let mut rest_chars = rest.chars();
    let under_cursor = rest_chars.next().map_or_else(|| " ".to_string(), String::from);
    let after = rest_chars.as_str();

    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::raw(before.to_string()));
    }
    spans.push(Span::styled(
        under_cursor,
        Style::default().bg(Color::White).fg(Color::Black),
    ));
    if !after.is_empty() {
        spans.push(Span::raw(after.to_string()));
    }
    spans
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = model.focus == Focus::Preview;
    let mut title = vec![Span::raw(" Preview ")];
    if model.preview_is_stale() {
        title.push(Span::styled(
            "[stale] ",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let block =
        pane_block(Line::from(title), focused).padding(Padding::horizontal(PREVIEW_PADDING));

    let viewport = model.preview_viewport();
    let visible_lines = model
        .document()
        .visible_lines(viewport.offset(), viewport.height() as usize);

    let content: Vec<Line> = visible_lines
        .iter()
        .map(|line| {
            let line_style = style::style_for_line_type(line.line_type());
            line.spans().map_or_else(
                || Line::from(Span::styled(line.content().to_string(), line_style)),
                |spans| {
                    Line::from(
                        spans
                            .iter()
                            .map(|span| {
                                Span::styled(
                                    span.text().to_string(),
                                    style::style_for_inline(line_style, span.style()),
                                )
                            })
                            .collect::<Vec<_>>(),
                    )
                },
            )
        })
        .collect();

    // Old frames can leave wide glyph halves behind.
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}
