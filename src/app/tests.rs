use std::fs;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tempfile::tempdir;

use crate::editor::Direction;
use crate::store::FileStore;
use crate::sync::SyncConfig;

use super::event_loop::ResizeDebouncer;
use super::{App, Focus, Message, Model, ReloadOutcome, ToastLevel, update};

const SETTLE: Duration = Duration::from_secs(5);

fn create_test_model(source: &str) -> Model {
    let mut model =
        Model::new(source, (80, 24), SyncConfig::with_debounce_ms(20), None).unwrap();
    assert!(model.sync.settle(SETTLE));
    model
}

fn create_long_test_model() -> Model {
    let mut md = String::from("# Test Document\n\n");
    for i in 1..=50 {
        md.push_str(&format!("Line {i} of content.\n\n"));
    }
    create_test_model(&md)
}

fn type_text(mut model: Model, text: &str) -> Model {
    for ch in text.chars() {
        model = update(model, Message::InsertChar(ch));
    }
    model
}

/// Let the debounce window pass and wait for the render.
fn flush_preview(model: &mut Model) {
    model.sync.tick(Instant::now() + Duration::from_secs(1));
    assert!(model.sync.settle(SETTLE));
    model.drain_status_events();
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

#[test]
fn test_initial_preview_matches_source() {
    let model = create_test_model("# Hello\n\nworld");
    assert_eq!(model.document().source(), "# Hello\n\nworld");
    assert!(!model.buffer.is_dirty());
    assert!(!model.preview_is_stale());
}

#[test]
fn test_typing_marks_dirty_and_arms_debounce() {
    let model = create_test_model("");
    let model = type_text(model, "# Hi");

    assert!(model.buffer.is_dirty());
    assert_eq!(model.buffer.text(), "# Hi");
    assert!(model.sync.next_deadline().is_some());
    assert_eq!(model.document().source(), "", "preview waits for the debounce");
}

#[test]
fn test_preview_catches_up_after_debounce() {
    let model = create_test_model("");
    let mut model = type_text(model, "# Hi");
    flush_preview(&mut model);

    assert_eq!(model.document().source(), "# Hi");
    assert_eq!(model.document().lines()[0].content(), "# Hi");
    assert!(model.sync.is_idle());
}

#[test]
fn test_cursor_moves_do_not_notify_synchronizer() {
    let model = create_test_model("abc");
    let model = update(model, Message::MoveEnd);
    let model = update(model, Message::MoveCursor(Direction::Left));

    assert_eq!(model.buffer.cursor().col, 2);
    assert!(model.sync.next_deadline().is_none());
}

#[test]
fn test_paste_inserts_whole_text() {
    let model = create_test_model("");
    let model = update(model, Message::Paste("one\ntwo".to_string()));

    assert_eq!(model.buffer.text(), "one\ntwo");
    assert_eq!(model.buffer.cursor().line, 1);
    assert_eq!(model.buffer.cursor().col, 3);
}

#[test]
fn test_force_render_skips_debounce() {
    let model = create_test_model("");
    let model = type_text(model, "text");
    let mut model = update(model, Message::ForceRender);

    assert!(model.sync.next_deadline().is_none());
    assert!(model.sync.settle(SETTLE));
    assert_eq!(model.document().source(), "text");
}

#[test]
fn test_switch_focus_toggles_and_renders() {
    let model = create_test_model("");
    let model = type_text(model, "x");
    let mut model = update(model, Message::SwitchFocus);
    assert_eq!(model.focus, Focus::Preview);
    assert!(model.sync.settle(SETTLE));
    assert_eq!(model.document().source(), "x");

    let model = update(model, Message::SwitchFocus);
    assert_eq!(model.focus, Focus::Editor);
}

#[test]
fn test_quit_when_clean_exits_immediately() {
    let model = create_test_model("clean");
    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_quit_with_unsaved_changes_needs_confirmation() {
    let model = type_text(create_test_model(""), "x");
    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
    assert!(model.quit_confirmed);
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));

    let model = update(model, Message::Quit);
    assert!(model.should_quit);
}

#[test]
fn test_other_message_resets_quit_confirmation() {
    let model = type_text(create_test_model(""), "x");
    let model = update(model, Message::Quit);
    let model = update(model, Message::MoveHome);
    assert!(!model.quit_confirmed);

    let model = update(model, Message::Quit);
    assert!(!model.should_quit);
}

#[test]
fn test_preview_scrolling() {
    let model = create_long_test_model();
    let model = update(model, Message::ScrollPreviewDown(5));
    assert_eq!(model.preview_viewport().offset(), 5);

    let model = update(model, Message::ScrollPreviewUp(2));
    assert_eq!(model.preview_viewport().offset(), 3);

    let model = update(model, Message::PreviewBottom);
    let viewport = model.preview_viewport();
    assert_eq!(
        viewport.offset(),
        viewport.total_lines() - viewport.height() as usize
    );

    let model = update(model, Message::PreviewTop);
    assert_eq!(model.preview_viewport().offset(), 0);
}

#[test]
fn test_cursor_page_down_scrolls_editor() {
    let model = create_long_test_model();
    let height = model.editor_height();
    let model = update(model, Message::CursorPageDown);

    assert_eq!(model.buffer.cursor().line, height);
    assert!(model.editor_scroll_offset > 0);
    assert!(model.buffer.cursor().line < model.editor_scroll_offset + height);

    let model = update(model, Message::MoveToStart);
    assert_eq!(model.editor_scroll_offset, 0);
}

#[test]
fn test_resize_updates_wrap_width_and_renders() {
    let mut model = create_test_model("word ".repeat(40).trim_end());
    let before = model.current_wrap_width();

    model = update(model, Message::Resize(120, 30));
    assert!(model.current_wrap_width() > before);
    assert_eq!(model.terminal_size, (120, 30));
    assert!(model.sync.settle(SETTLE));
    let longest = model
        .document()
        .lines()
        .iter()
        .map(|line| line.content().chars().count())
        .max()
        .unwrap();
    assert!(longest > before as usize);
    assert!(longest <= model.current_wrap_width() as usize);
}

#[test]
fn test_max_wrap_width_caps_preview() {
    let mut model = Model::new("x", (200, 30), SyncConfig::default(), Some(40)).unwrap();
    assert!(model.sync.settle(SETTLE));
    assert_eq!(model.current_wrap_width(), 40);
}

#[test]
fn test_help_toggle() {
    let model = create_test_model("");
    let model = update(model, Message::ToggleHelp);
    assert!(model.help_visible);
    let model = update(model, Message::HideHelp);
    assert!(!model.help_visible);
}

#[test]
fn test_render_failure_shows_toast_and_stale_marker() {
    let model = create_test_model("ok");
    let model = update(model, Message::MoveToEnd);
    let deep = format!("\n\n{} too deep", ">".repeat(200));
    let pasted = deep.chars().count();
    let mut model = update(model, Message::Paste(deep));
    flush_preview(&mut model);

    assert!(model.preview_is_stale());
    assert_eq!(model.document().source(), "ok", "previous preview is kept");
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Error);
    assert!(message.starts_with("Preview not updated"), "{message}");

    // Remove the nesting and the preview recovers.
    let mut model = model;
    for _ in 0..pasted {
        model = update(model, Message::DeleteBack);
    }
    flush_preview(&mut model);

    assert!(!model.preview_is_stale());
    assert_eq!(model.document().source(), "ok");
    assert_eq!(model.active_toast(), Some(("Preview updated", ToastLevel::Info)));
}

#[test]
fn test_save_writes_file_and_clears_dirty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    let model = create_test_model("").with_store(Box::new(FileStore::new(&path)));
    let mut model = type_text(model, "# Saved");

    model = update(model, Message::Save);
    App::handle_message_side_effects(&mut model, &Message::Save);

    assert_eq!(fs::read_to_string(&path).unwrap(), "# Saved");
    assert!(!model.buffer.is_dirty());
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Info);
    assert!(message.starts_with("Saved"));
    assert!(model.sync.settle(SETTLE));
    assert_eq!(model.document().source(), "# Saved");
}

#[test]
fn test_save_without_file_reports_error() {
    let mut model = type_text(create_test_model(""), "x");
    App::handle_message_side_effects(&mut model, &Message::Save);

    assert!(model.buffer.is_dirty());
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Error);
    assert!(message.contains("no file to save to"));
}

#[test]
fn test_reload_after_own_save_is_unchanged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    let mut model = create_test_model("same").with_store(Box::new(FileStore::new(&path)));
    model.save().unwrap();

    assert_eq!(
        model.reload_from_store(Instant::now()).unwrap(),
        ReloadOutcome::Unchanged
    );
}

#[test]
fn test_typing_right_after_save_is_not_a_conflict() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    let model = create_test_model("").with_store(Box::new(FileStore::new(&path)));
    let mut model = type_text(model, "hello");
    App::handle_message_side_effects(&mut model, &Message::Save);
    model = update(model, Message::MoveToStart);
    let mut model = type_text(model, "x");

    App::handle_message_side_effects(&mut model, &Message::FileChanged);

    assert_eq!(model.buffer.text(), "xhello");
    assert!(model.buffer.is_dirty());
    let (message, level) = model.active_toast().unwrap();
    assert_eq!(level, ToastLevel::Info);
    assert!(message.starts_with("Saved"), "save toast kept: {message}");
}

#[test]
fn test_external_change_reloads_clean_buffer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "before").unwrap();
    let mut model = create_test_model("before").with_store(Box::new(FileStore::new(&path)));

    fs::write(&path, "after").unwrap();
    App::handle_message_side_effects(&mut model, &Message::FileChanged);

    assert_eq!(model.buffer.text(), "after");
    assert!(!model.buffer.is_dirty());
    assert_eq!(
        model.active_toast(),
        Some(("Reloaded: file changed on disk", ToastLevel::Info))
    );
    flush_preview(&mut model);
    assert_eq!(model.document().source(), "after");
}

#[test]
fn test_external_change_keeps_unsaved_edits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "before").unwrap();
    let model = create_test_model("before").with_store(Box::new(FileStore::new(&path)));
    let mut model = type_text(model, "mine ");

    fs::write(&path, "theirs").unwrap();
    App::handle_message_side_effects(&mut model, &Message::FileChanged);

    assert_eq!(model.buffer.text(), "mine before");
    assert_eq!(model.active_toast().map(|(_, level)| level), Some(ToastLevel::Warning));
}

#[test]
fn test_file_name_defaults_to_untitled() {
    let model = create_test_model("");
    assert_eq!(model.file_name(), "untitled");
    assert!(model.file_path().is_none());
}

#[test]
fn test_editor_keys_map_to_messages() {
    let model = create_test_model("");
    assert_eq!(
        App::handle_key(key(KeyCode::Char('a')), &model),
        Some(Message::InsertChar('a'))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Enter), &model),
        Some(Message::SplitLine)
    );
    assert_eq!(
        App::handle_key(KeyEvent::new(KeyCode::Left, KeyModifiers::CONTROL), &model),
        Some(Message::MoveWordLeft)
    );
    assert_eq!(App::handle_key(ctrl('s'), &model), Some(Message::Save));
    assert_eq!(App::handle_key(ctrl('q'), &model), Some(Message::Quit));
    assert_eq!(App::handle_key(ctrl('r'), &model), Some(Message::ForceRender));
    assert_eq!(App::handle_key(ctrl('x'), &model), None);
    assert_eq!(
        App::handle_key(key(KeyCode::Tab), &model),
        Some(Message::SwitchFocus)
    );
}

#[test]
fn test_preview_keys_map_to_scrolling() {
    let mut model = create_test_model("");
    model.focus = Focus::Preview;
    assert_eq!(
        App::handle_key(key(KeyCode::Char('j')), &model),
        Some(Message::ScrollPreviewDown(1))
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char('G')), &model),
        Some(Message::PreviewBottom)
    );
    assert_eq!(
        App::handle_key(key(KeyCode::Char(' ')), &model),
        Some(Message::PreviewPageDown)
    );
    assert_eq!(App::handle_key(key(KeyCode::Char('x')), &model), None);
}

#[test]
fn test_any_key_closes_help() {
    let mut model = create_test_model("");
    model.help_visible = true;
    assert_eq!(
        App::handle_key(key(KeyCode::Char('a')), &model),
        Some(Message::HideHelp)
    );
    assert_eq!(App::handle_key(ctrl('q'), &model), Some(Message::Quit));
}

#[test]
fn test_key_release_is_ignored() {
    let model = create_test_model("");
    let mut debouncer = ResizeDebouncer::new(100);
    let mut release = key(KeyCode::Char('a'));
    release.kind = KeyEventKind::Release;
    assert_eq!(
        App::handle_event(&Event::Key(release), &model, 0, &mut debouncer),
        None
    );
}

#[test]
fn test_paste_event_normalizes_line_endings() {
    let model = create_test_model("");
    let mut debouncer = ResizeDebouncer::new(100);
    assert_eq!(
        App::handle_event(&Event::Paste("a\r\nb".into()), &model, 0, &mut debouncer),
        Some(Message::Paste("a\nb".into()))
    );
}

#[test]
fn test_resize_event_is_debounced() {
    let model = create_test_model("");
    let mut debouncer = ResizeDebouncer::new(100);
    assert_eq!(
        App::handle_event(&Event::Resize(100, 40), &model, 0, &mut debouncer),
        None
    );
    assert!(debouncer.is_pending());
    assert_eq!(debouncer.take_ready(100), Some((100, 40)));
}

#[test]
fn test_resize_debouncer_waits_for_quiet_period() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(120, 40, 0);

    assert!(debouncer.take_ready(50).is_none());
    assert_eq!(debouncer.take_ready(100), Some((120, 40)));
}

#[test]
fn test_resize_debouncer_uses_latest_size() {
    let mut debouncer = ResizeDebouncer::new(100);
    debouncer.queue(120, 40, 0);
    debouncer.queue(140, 50, 20);

    assert!(debouncer.take_ready(80).is_none());
    assert_eq!(debouncer.take_ready(120), Some((140, 50)));
}
