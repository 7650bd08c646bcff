// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. sync::SyncError)
    clippy::module_name_repetitions
)]

//! # MarkMate
//!
//! A split-pane terminal markdown editor with a live preview.
//!
//! The left pane is a plain text editor; the right pane shows the rendered
//! markdown. The preview follows the buffer through a debounced, off-thread
//! render pipeline so typing never waits on the markdown renderer.
//!
//! ## Architecture
//!
//! MarkMate uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: State transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`sync`]: Debounced preview synchronizer and render worker
//! - [`document`]: Markdown rendering into preview lines
//! - [`editor`]: Text buffer with a cursor
//! - [`store`]: Loading and saving the document
//! - [`ui`]: Terminal UI components
//! - [`highlight`]: Syntax highlighting
//! - [`watcher`]: File watching
//! - [`config`]: Saved defaults
//! - [`perf`]: Timing and debug event log

pub mod app;
pub mod config;
pub mod document;
pub mod editor;
pub mod highlight;
pub mod perf;
pub mod store;
pub mod sync;
pub mod ui;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::document::{Document, MarkdownRenderer};
    pub use crate::editor::EditorBuffer;
    pub use crate::sync::{PreviewSynchronizer, SyncConfig};
    pub use crate::ui::viewport::Viewport;
}
