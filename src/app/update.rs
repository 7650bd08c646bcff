use std::time::Instant;

use crate::app::Model;
use crate::app::model::{Focus, ToastLevel};
use crate::editor::Direction;

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert a character at the cursor
    InsertChar(char),
    /// Split the line at the cursor (Enter)
    SplitLine,
    /// Delete the character before the cursor (Backspace)
    DeleteBack,
    /// Delete the character at the cursor (Delete)
    DeleteForward,
    /// Insert pasted text at the cursor
    Paste(String),

    // Cursor
    MoveCursor(Direction),
    MoveHome,
    MoveEnd,
    MoveWordLeft,
    MoveWordRight,
    MoveToStart,
    MoveToEnd,
    /// Move the cursor up one editor page
    CursorPageUp,
    /// Move the cursor down one editor page
    CursorPageDown,

    // Preview navigation
    ScrollPreviewUp(usize),
    ScrollPreviewDown(usize),
    PreviewPageUp,
    PreviewPageDown,
    PreviewTop,
    PreviewBottom,

    // Application
    /// Move focus to the other pane
    SwitchFocus,
    /// Render the preview now, skipping the debounce window
    ForceRender,
    /// Save the buffer (effects perform the write)
    Save,
    /// Quit, asking for confirmation when there are unsaved changes
    Quit,
    ToggleHelp,
    HideHelp,
    /// Terminal resized
    Resize(u16, u16),
    /// The open file changed on disk (effects perform the reload)
    FileChanged,
}

impl Message {
    /// Whether the message changes the buffer text.
    pub const fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::InsertChar(_)
                | Self::SplitLine
                | Self::DeleteBack
                | Self::DeleteForward
                | Self::Paste(_)
        )
    }

    const fn moves_cursor(&self) -> bool {
        self.is_edit()
            || matches!(
                self,
                Self::MoveCursor(_)
                    | Self::MoveHome
                    | Self::MoveEnd
                    | Self::MoveWordLeft
                    | Self::MoveWordRight
                    | Self::MoveToStart
                    | Self::MoveToEnd
                    | Self::CursorPageUp
                    | Self::CursorPageDown
            )
    }
}

/// Apply `msg` to `model`.
///
/// Buffer changes are forwarded to the preview synchronizer, which restarts
/// its debounce timer.
pub fn update(mut model: Model, msg: Message) -> Model {
    if !matches!(msg, Message::Quit | Message::Resize(..)) {
        model.quit_confirmed = false;
    }
    let revision = model.buffer.revision();
    let moves_cursor = msg.moves_cursor();

    match msg {
        Message::InsertChar(ch) => model.buffer.insert_char(ch),
        Message::SplitLine => model.buffer.split_line(),
        Message::DeleteBack => {
            model.buffer.delete_back();
        }
        Message::DeleteForward => {
            model.buffer.delete_forward();
        }
        Message::Paste(text) => model.buffer.insert_str(&text),

        Message::MoveCursor(direction) => model.buffer.move_cursor(direction),
        Message::MoveHome => model.buffer.move_home(),
        Message::MoveEnd => model.buffer.move_end(),
        Message::MoveWordLeft => model.buffer.move_word_left(),
        Message::MoveWordRight => model.buffer.move_word_right(),
        Message::MoveToStart => model.buffer.move_to_start(),
        Message::MoveToEnd => model.buffer.move_to_end(),
        Message::CursorPageUp => {
            let cursor = model.buffer.cursor();
            let line = cursor.line.saturating_sub(model.editor_height().max(1));
            model.buffer.move_to(line, cursor.col);
        }
        Message::CursorPageDown => {
            let cursor = model.buffer.cursor();
            let line = (cursor.line + model.editor_height().max(1))
                .min(model.buffer.line_count().saturating_sub(1));
            model.buffer.move_to(line, cursor.col);
        }

        Message::ScrollPreviewUp(n) => model.preview_viewport_mut().scroll_up(n),
        Message::ScrollPreviewDown(n) => model.preview_viewport_mut().scroll_down(n),
        Message::PreviewPageUp => model.preview_viewport_mut().page_up(),
        Message::PreviewPageDown => model.preview_viewport_mut().page_down(),
        Message::PreviewTop => model.preview_viewport_mut().go_to_top(),
        Message::PreviewBottom => model.preview_viewport_mut().go_to_bottom(),

        Message::SwitchFocus => {
            model.focus = match model.focus {
                Focus::Editor => Focus::Preview,
                Focus::Preview => Focus::Editor,
            };
            model.sync.force_render();
        }
        Message::ForceRender | Message::Save => model.sync.force_render(),
        Message::Quit => {
            if !model.buffer.is_dirty() || model.quit_confirmed {
                model.should_quit = true;
            } else {
                model.quit_confirmed = true;
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes. Press Ctrl+Q again to quit without saving",
                );
            }
        }
        Message::ToggleHelp => model.help_visible = !model.help_visible,
        Message::HideHelp => model.help_visible = false,
        Message::Resize(width, height) => {
            if model.apply_resize(width, height) {
                model.sync.force_render();
            }
        }
        Message::FileChanged => {}
    }

    if model.buffer.revision() != revision {
        model.notify_edit(Instant::now());
    }
    if moves_cursor {
        model.ensure_cursor_visible();
    }
    model
}
