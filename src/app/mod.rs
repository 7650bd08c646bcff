//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions; buffer edits are handed to the preview
//!   synchronizer here
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Focus, Model, PreviewPane, ReloadOutcome, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::sync::DEFAULT_DEBOUNCE_MS;

/// Shown when no file is given or the file does not exist yet.
pub const WELCOME_MARKDOWN: &str = r#"# Welcome to MarkMate

## A simple markdown editor

This is a *live preview* of your markdown content.

### Features:
- Real-time markdown preview
- Simple and clean interface
- Syntax highlighting

```python
# You can even include code blocks
def hello_world():
    print("Hello, Markdown!")
```

> Blockquotes are supported too!

Enjoy writing with **MarkMate**!
"#;

/// Main application struct that owns the terminal and runs the event loop.
#[derive(Debug, Clone)]
pub struct App {
    file_path: Option<PathBuf>,
    debounce_ms: u64,
    watch_enabled: bool,
    wrap_width: Option<u16>,
}

impl App {
    /// Create an application editing `file_path`, or an unsaved welcome
    /// document when `None`.
    pub const fn new(file_path: Option<PathBuf>) -> Self {
        Self {
            file_path,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            watch_enabled: false,
            wrap_width: None,
        }
    }

    /// Quiet period after the last keystroke before the preview renders.
    #[must_use]
    pub const fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Reload the buffer when the file changes on disk.
    #[must_use]
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Cap the preview wrap width.
    #[must_use]
    pub const fn with_wrap_width(mut self, width: Option<u16>) -> Self {
        self.wrap_width = width;
        self
    }
}

#[cfg(test)]
mod tests;
