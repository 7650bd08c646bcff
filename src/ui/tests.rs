use super::*;
use crate::app::{Focus, Model, ToastLevel};
use crate::sync::SyncConfig;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::style::Modifier;
use std::time::Duration;

const SETTLE: Duration = Duration::from_secs(5);

fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).unwrap()
}

fn settled_model(source: &str, width: u16, height: u16) -> Model {
    let mut model = Model::new(source, (width, height), SyncConfig::default(), None).unwrap();
    assert!(model.sync.settle(SETTLE), "initial render should finish");
    model
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn draw(model: &Model, terminal: &mut Terminal<TestBackend>) -> String {
    terminal.draw(|frame| render(model, frame)).unwrap();
    screen_text(terminal)
}

#[test]
fn test_layout_reserves_footer_rows() {
    let screen = split_screen(Rect::new(0, 0, 80, 24));
    assert_eq!(screen.panes.height, 22);
    assert_eq!(screen.status.y, 22);
    assert_eq!(screen.toast.y, 23);
}

#[test]
fn test_panes_split_evenly() {
    let (editor, preview) = split_panes(Rect::new(0, 0, 80, 10));
    assert_eq!(editor.width, 40);
    assert_eq!(preview.width, 40);
    assert_eq!(preview.x, 40);
}

#[test]
fn test_content_sizes_account_for_borders_and_padding() {
    assert_eq!(preview_content_width(80), 36);
    assert_eq!(pane_content_height(24), 20);
    assert_eq!(preview_content_width(0), 1);
    assert_eq!(pane_content_height(2), 1);
}

#[test]
fn test_render_shows_both_panes() {
    let model = settled_model("# Hello\n\nSome *text*.", 80, 20);
    let mut terminal = create_test_terminal(80, 20);
    let screen = draw(&model, &mut terminal);

    assert!(screen.contains("Editor"));
    assert!(screen.contains("Preview"));
    assert!(screen.contains("1 # Hello"), "editor shows source with gutter");
    assert!(screen.contains("Some text."), "preview shows rendered text");
}

#[test]
fn test_status_bar_shows_file_and_cursor() {
    let model = settled_model("abc", 80, 12);
    let mut terminal = create_test_terminal(80, 12);
    let screen = draw(&model, &mut terminal);

    let status_row = screen.lines().nth(10).unwrap();
    assert!(status_row.contains("EDIT"));
    assert!(status_row.contains("untitled"));
    assert!(status_row.contains("Ln 1, Col 1"));
    assert!(!status_row.contains("[modified]"));
}

#[test]
fn test_status_bar_shows_preview_focus() {
    let mut model = settled_model("abc", 80, 12);
    model.focus = Focus::Preview;
    let mut terminal = create_test_terminal(80, 12);
    let screen = draw(&model, &mut terminal);

    assert!(screen.lines().nth(10).unwrap().contains("PREVIEW"));
}

#[test]
fn test_toast_renders_on_last_row() {
    let mut model = settled_model("abc", 80, 12);
    model.show_toast(ToastLevel::Warning, "careful");
    let mut terminal = create_test_terminal(80, 12);
    let screen = draw(&model, &mut terminal);

    assert!(screen.lines().last().unwrap().starts_with("[warn] careful"));
}

#[test]
fn test_help_overlay_lists_bindings() {
    let mut model = settled_model("abc", 80, 30);
    model.help_visible = true;
    let mut terminal = create_test_terminal(80, 30);
    let screen = draw(&model, &mut terminal);

    assert!(screen.contains("Help"));
    assert!(screen.contains("Ctrl+S"));
    assert!(screen.contains("Switch pane"));
}

#[test]
fn test_preview_styles_heading() {
    let model = settled_model("# Title", 80, 12);
    let mut terminal = create_test_terminal(80, 12);
    terminal.draw(|frame| render(&model, frame)).unwrap();

    let buffer = terminal.backend().buffer();
    // Preview content starts after the left border and padding.
    let cell = &buffer[(44, 1)];
    assert_eq!(buffer[(42, 1)].symbol(), "#");
    assert_eq!(cell.symbol(), "T");
    assert!(cell.modifier.contains(Modifier::BOLD));
}

#[test]
fn test_small_terminal_does_not_panic() {
    let model = settled_model("# Tiny\n\ntext", 10, 3);
    let mut terminal = create_test_terminal(10, 3);
    draw(&model, &mut terminal);
}
