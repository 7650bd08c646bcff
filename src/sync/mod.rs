//! Live preview synchronization.
//!
//! Keeps a rendered preview eventually consistent with an editor buffer
//! that changes on every keystroke:
//! - [`PreviewSynchronizer`]: debounces edits, keeps one render in flight,
//!   and orders display updates by sequence number
//! - [`RenderWorker`]: background thread that owns the [`Renderer`]
//! - [`EditSignal`] / [`RenderRequest`] / [`RenderResult`]: the values that
//!   move between the editor, the worker, and the display
//!
//! Render and display failures never leave this module as errors. They are
//! reported on the status channel as [`StatusEvent`]s and the last good
//! preview stays on screen.

mod error;
mod synchronizer;
mod types;
mod worker;

pub use error::{DisplayError, RenderError, SyncError};
pub use synchronizer::PreviewSynchronizer;
pub use types::{
    DEFAULT_DEBOUNCE_MS, EditSignal, RenderRequest, RenderResult, StatusEvent, SyncConfig,
    SynchronizerState,
};
pub use worker::{RenderWorker, render};

/// Turns markdown source into something a [`DisplaySink`] can show.
///
/// Implementations run on the render worker thread, one call at a time.
/// Rendering the same source twice must produce the same view.
pub trait Renderer: Send + 'static {
    type View: Send + 'static;

    /// Render `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the source cannot be rendered.
    fn render(&mut self, source: &str) -> Result<Self::View, RenderError>;
}

/// Receives rendered views for display.
pub trait DisplaySink<V> {
    /// Show `view`, replacing whatever was displayed before.
    ///
    /// # Errors
    ///
    /// Returns a [`DisplayError`] if the view could not be shown. The
    /// previous view is assumed to still be visible.
    fn show(&mut self, view: V) -> Result<(), DisplayError>;
}
