use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::model::Focus;
use crate::app::{App, Message, Model};
use crate::editor::Direction;

use super::event_loop::ResizeDebouncer;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Paste(text) if model.focus == Focus::Editor && !model.help_visible => {
                Some(Message::Paste(text.replace("\r\n", "\n")))
            }
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if model.help_visible {
            return match key.code {
                KeyCode::Char('q') if ctrl => Some(Message::Quit),
                _ => Some(Message::HideHelp),
            };
        }

        // Global bindings
        match key.code {
            KeyCode::Char('s') if ctrl => return Some(Message::Save),
            KeyCode::Char('q') if ctrl => return Some(Message::Quit),
            KeyCode::Char('r') if ctrl => return Some(Message::ForceRender),
            KeyCode::Tab | KeyCode::BackTab => return Some(Message::SwitchFocus),
            KeyCode::F(1) => return Some(Message::ToggleHelp),
            _ => {}
        }

        match model.focus {
            Focus::Editor => Self::handle_editor_key(key, ctrl),
            Focus::Preview => Self::handle_preview_key(key),
        }
    }

    fn handle_editor_key(key: KeyEvent, ctrl: bool) -> Option<Message> {
        match key.code {
            KeyCode::Left if ctrl => Some(Message::MoveWordLeft),
            KeyCode::Right if ctrl => Some(Message::MoveWordRight),
            KeyCode::Home if ctrl => Some(Message::MoveToStart),
            KeyCode::End if ctrl => Some(Message::MoveToEnd),
            KeyCode::Left => Some(Message::MoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::MoveCursor(Direction::Right)),
            KeyCode::Up => Some(Message::MoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::MoveCursor(Direction::Down)),
            KeyCode::Home => Some(Message::MoveHome),
            KeyCode::End => Some(Message::MoveEnd),
            KeyCode::PageUp => Some(Message::CursorPageUp),
            KeyCode::PageDown => Some(Message::CursorPageDown),
            KeyCode::Enter => Some(Message::SplitLine),
            KeyCode::Backspace => Some(Message::DeleteBack),
            KeyCode::Delete => Some(Message::DeleteForward),
            KeyCode::Char(c) if !ctrl => Some(Message::InsertChar(c)),
            _ => None,
        }
    }

    fn handle_preview_key(key: KeyEvent) -> Option<Message> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(Message::ScrollPreviewUp(1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::ScrollPreviewDown(1)),
            KeyCode::PageUp => Some(Message::PreviewPageUp),
            KeyCode::PageDown | KeyCode::Char(' ') => Some(Message::PreviewPageDown),
            KeyCode::Home | KeyCode::Char('g') => Some(Message::PreviewTop),
            KeyCode::End | KeyCode::Char('G') => Some(Message::PreviewBottom),
            _ => None,
        }
    }
}
