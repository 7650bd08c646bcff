//! Watching the open file for changes made by other programs.
//!
//! Uses the notify crate for cross-platform file system events. Events are
//! coalesced: a burst of writes produces one change notification once the
//! file has been quiet for the debounce window.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, unbounded};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a single file and emits debounced change notifications.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    target_path: PathBuf,
    target_name: Option<OsString>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl FileWatcher {
    /// Create a watcher for `path`. The file itself need not exist yet, but
    /// its directory must.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the directory
    /// cannot be watched.
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are canonical; match them.
        let target_path = canonical_target(path.as_ref());
        let target_name = target_path.file_name().map(std::ffi::OsStr::to_os_string);
        let watch_root = watch_root_for(&target_path);

        let (tx, rx) = unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %target_path.display(), "watching file");

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            target_path,
            target_name,
            debounce,
            pending_since: None,
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// When [`take_change_ready`](Self::take_change_ready) could next
    /// return `true`, if a change is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_since.map(|since| since + self.debounce)
    }

    /// Drain pending events. Returns true once a change has settled.
    pub fn take_change_ready(&mut self, now: Instant) -> bool {
        let mut relevant = 0u32;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => relevant += 1,
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    crate::perf::log_event("watcher.error", format!("{err}"));
                }
            }
        }

        if relevant > 0 {
            crate::perf::log_event("watcher.poll", format!("relevant={relevant}"));
            self.pending_since = Some(now);
        }

        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| {
            path == &self.watch_root
                || path == &self.target_path
                || self
                    .target_name
                    .as_ref()
                    .is_some_and(|name| path.file_name().is_some_and(|f| f == name))
        })
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("target_path", &self.target_path)
            .field("debounce", &self.debounce)
            .field("pending_since", &self.pending_since)
            .finish_non_exhaustive()
    }
}

/// Canonicalize through the parent when the file does not exist yet.
fn canonical_target(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let parent = watch_root_for(path);
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn watch_root_for(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}
