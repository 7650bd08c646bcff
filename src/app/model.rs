use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, unbounded};

use crate::document::{Document, MarkdownRenderer};
use crate::editor::EditorBuffer;
use crate::store::{PersistenceStore, StoreError};
use crate::sync::{
    DisplayError, DisplaySink, PreviewSynchronizer, StatusEvent, SyncConfig, SyncError,
};
use crate::ui::viewport::Viewport;

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which pane receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Preview,
}

/// The preview side of the screen: the document on display and its scroll
/// position.
#[derive(Debug, Clone)]
pub struct PreviewPane {
    document: Document,
    viewport: Viewport,
}

impl PreviewPane {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            document: Document::empty(),
            viewport: Viewport::new(width, height, 0),
        }
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub const fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }
}

impl DisplaySink<Document> for PreviewPane {
    fn show(&mut self, view: Document) -> Result<(), DisplayError> {
        self.viewport.set_total_lines(view.line_count());
        self.document = view;
        Ok(())
    }
}

/// The complete application state.
pub struct Model {
    /// The text being edited
    pub buffer: EditorBuffer,
    /// Keeps the preview in step with the buffer
    pub sync: PreviewSynchronizer<Document, PreviewPane>,
    status_rx: Receiver<StatusEvent>,
    /// Where the document is saved, if anywhere
    store: Option<Box<dyn PersistenceStore>>,
    /// Text last read from or written to the store
    disk_text: Option<String>,
    /// Pane receiving navigation keys
    pub focus: Focus,
    /// First buffer line shown in the editor pane
    pub editor_scroll_offset: usize,
    /// Terminal size in cells
    pub terminal_size: (u16, u16),
    /// Preview wrap width shared with the render worker
    wrap_width: Arc<AtomicU16>,
    /// Upper bound for the wrap width from `--wrap-width`
    pub max_wrap_width: Option<u16>,
    /// Whether external changes to the file are being watched
    pub watch_enabled: bool,
    /// Whether the help overlay is visible
    pub help_visible: bool,
    /// Set after a first quit attempt with unsaved changes
    pub quit_confirmed: bool,
    /// Whether the app should quit
    pub should_quit: bool,
    toast: Option<Toast>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path())
            .field("revision", &self.buffer.revision())
            .field("focus", &self.focus)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model editing `source` and render its first preview.
    ///
    /// # Errors
    ///
    /// Returns an error if the render worker cannot be started.
    pub fn new(
        source: &str,
        terminal_size: (u16, u16),
        sync_config: SyncConfig,
        max_wrap_width: Option<u16>,
    ) -> std::io::Result<Self> {
        let (width, height) = terminal_size;
        let wrap = preview_wrap_width(width, max_wrap_width);
        let renderer = MarkdownRenderer::new(wrap);
        let wrap_width = renderer.width_handle();
        let pane = PreviewPane::new(
            crate::ui::preview_content_width(width),
            crate::ui::pane_content_height(height),
        );
        let (status_tx, status_rx) = unbounded();
        let sync = PreviewSynchronizer::new(sync_config, renderer, pane, status_tx)?;

        let mut model = Self {
            buffer: EditorBuffer::from_text(source),
            sync,
            status_rx,
            store: None,
            disk_text: None,
            focus: Focus::Editor,
            editor_scroll_offset: 0,
            terminal_size,
            wrap_width,
            max_wrap_width,
            watch_enabled: false,
            help_visible: false,
            quit_confirmed: false,
            should_quit: false,
            toast: None,
        };

        // The initial content skips the debounce window.
        model.notify_edit(Instant::now());
        model.sync.force_render();
        Ok(model)
    }

    /// Attach the store the buffer was loaded from.
    ///
    /// The current buffer is taken as the store's content, so a watcher
    /// event that finds the same text on disk is not a change.
    #[must_use]
    pub fn with_store(mut self, store: Box<dyn PersistenceStore>) -> Self {
        self.store = Some(store);
        self.disk_text = Some(self.buffer.text());
        self
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.store.as_deref().map(PersistenceStore::location)
    }

    pub fn file_name(&self) -> String {
        self.file_path()
            .and_then(Path::file_name)
            .map_or_else(|| "untitled".to_string(), |n| n.to_string_lossy().into_owned())
    }

    pub fn document(&self) -> &Document {
        self.sync.display().document()
    }

    pub fn preview_viewport(&self) -> &Viewport {
        self.sync.display().viewport()
    }

    pub fn preview_viewport_mut(&mut self) -> &mut Viewport {
        self.sync.display_mut().viewport_mut()
    }

    /// Whether the preview shows an older version than the buffer because
    /// the newest render failed.
    pub fn preview_is_stale(&self) -> bool {
        self.sync.is_failing() && self.sync.is_behind()
    }

    pub fn current_wrap_width(&self) -> u16 {
        self.wrap_width.load(Ordering::Relaxed)
    }

    /// Hand the current buffer content to the synchronizer.
    pub(super) fn notify_edit(&mut self, now: Instant) {
        if let Err(err) = self.sync.on_edit(self.buffer.edit_signal(), now) {
            // Revisions only grow, so this would be a bookkeeping bug.
            tracing::warn!(error = %err, "edit signal rejected");
        }
        crate::perf::log_event("editor.edit", format!("rev={}", self.buffer.revision()));
    }

    /// Recompute pane sizes after a terminal resize.
    ///
    /// Returns `true` if the preview wrap width changed.
    pub(super) fn apply_resize(&mut self, width: u16, height: u16) -> bool {
        self.terminal_size = (width, height);
        self.preview_viewport_mut().resize(
            crate::ui::preview_content_width(width),
            crate::ui::pane_content_height(height),
        );
        self.ensure_cursor_visible();
        let wrap = preview_wrap_width(width, self.max_wrap_width);
        self.wrap_width.swap(wrap, Ordering::Relaxed) != wrap
    }

    pub fn editor_height(&self) -> usize {
        crate::ui::pane_content_height(self.terminal_size.1) as usize
    }

    /// Scroll the editor so the cursor line is on screen.
    pub(super) fn ensure_cursor_visible(&mut self) {
        let height = self.editor_height().max(1);
        let line = self.buffer.cursor().line;
        if line < self.editor_scroll_offset {
            self.editor_scroll_offset = line;
        } else if line >= self.editor_scroll_offset + height {
            self.editor_scroll_offset = line + 1 - height;
        }
    }

    /// Turn pending status events into toasts.
    ///
    /// Returns `true` if any event was handled.
    pub fn drain_status_events(&mut self) -> bool {
        let mut handled = false;
        while let Ok(event) = self.status_rx.try_recv() {
            handled = true;
            match event {
                StatusEvent::Failed(SyncError::RenderFailure { detail, .. }) => {
                    self.show_toast(ToastLevel::Error, format!("Preview not updated: {detail}"));
                }
                StatusEvent::Failed(err) => {
                    self.show_toast(ToastLevel::Error, format!("Preview error: {err}"));
                }
                StatusEvent::Recovered { .. } => {
                    self.show_toast(ToastLevel::Info, "Preview updated");
                }
            }
        }
        handled
    }

    pub fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub(super) fn toast_deadline(&self) -> Option<Instant> {
        self.toast.as_ref().map(|toast| toast.expires_at)
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }

    /// Write the buffer through the store.
    pub(super) fn save(&mut self) -> Result<PathBuf, StoreError> {
        let Some(store) = self.store.as_deref() else {
            return Err(StoreError::NoLocation);
        };
        let text = self.buffer.text();
        store.save(&text)?;
        let location = store.location().to_path_buf();
        self.disk_text = Some(text);
        self.buffer.mark_clean();
        Ok(location)
    }

    /// Reload the buffer from the store after an external change.
    pub(super) fn reload_from_store(
        &mut self,
        now: Instant,
    ) -> Result<ReloadOutcome, StoreError> {
        let Some(store) = self.store.as_deref() else {
            return Ok(ReloadOutcome::Unchanged);
        };
        let Some(text) = store.load()? else {
            return Ok(ReloadOutcome::Unchanged);
        };
        // Our own save, or a write that left the content as we last saw it.
        if self.disk_text.as_deref() == Some(text.as_str()) || text == self.buffer.text() {
            self.disk_text = Some(text);
            return Ok(ReloadOutcome::Unchanged);
        }
        if self.buffer.is_dirty() {
            return Ok(ReloadOutcome::Conflict);
        }
        self.buffer.set_text(&text);
        self.disk_text = Some(text);
        self.ensure_cursor_visible();
        self.notify_edit(now);
        Ok(ReloadOutcome::Reloaded)
    }
}

/// What happened when the file changed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Disk content matches the buffer or our last save.
    Unchanged,
    Reloaded,
    /// The buffer has unsaved edits; it was left alone.
    Conflict,
}

fn preview_wrap_width(terminal_width: u16, max_wrap_width: Option<u16>) -> u16 {
    let content = crate::ui::preview_content_width(terminal_width);
    match max_wrap_width {
        Some(max) if max > 0 => content.min(max),
        _ => content,
    }
}
