use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).clamp(20, 60);
    let popup_height = area.height.saturating_sub(4).clamp(8, 30);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(Color::Indexed(245));

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::styled("Editor", section_style));
    lines.push(Line::raw("  Arrows, Home/End    Move cursor"));
    lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    lines.push(Line::raw("  Ctrl+Home/End       Buffer start / end"));
    lines.push(Line::raw("  PageUp/PageDown     Move by a page"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("Preview", section_style));
    lines.push(Line::raw("  j/k or Up/Down      Scroll"));
    lines.push(Line::raw("  Space/PageDown      Page down"));
    lines.push(Line::raw("  PageUp              Page up"));
    lines.push(Line::raw("  g / G               Top / bottom"));
    lines.push(Line::raw(""));

    lines.push(Line::styled("General", section_style));
    lines.push(Line::raw("  Tab                 Switch pane"));
    lines.push(Line::raw("  Ctrl+S              Save"));
    lines.push(Line::raw("  Ctrl+R              Re-render preview"));
    lines.push(Line::raw("  Ctrl+Q              Quit"));
    lines.push(Line::raw("  F1                  Toggle help"));
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        format!(
            "  Preview renders {}ms after typing stops",
            model.sync.config().debounce.as_millis()
        ),
        dim_style,
    ));

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // border(1) + padding(1) on each side
    let inner = Rect::new(
        popup.x + 2,
        popup.y + 2,
        popup.width.saturating_sub(4),
        popup.height.saturating_sub(4),
    );
    let content_height = inner.height.saturating_sub(1);
    let visible: Vec<Line> = lines.into_iter().take(content_height as usize).collect();
    frame.render_widget(
        Paragraph::new(visible),
        Rect::new(inner.x, inner.y, inner.width, content_height),
    );

    let footer_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    let footer = Line::styled("any key closes", dim_style);
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
