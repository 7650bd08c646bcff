use std::time::{Duration, Instant};

use crate::app::model::ReloadOutcome;
use crate::app::{App, Message, Model, ToastLevel};
use crate::watcher::FileWatcher;

/// Quiet period before an external change is reloaded.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

impl App {
    pub(super) fn make_file_watcher(model: &mut Model) -> Option<FileWatcher> {
        let path = model.file_path()?.to_path_buf();
        match FileWatcher::new(&path, WATCH_DEBOUNCE) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                model.watch_enabled = false;
                model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                tracing::warn!(path = %path.display(), error = %err, "cannot watch file");
                None
            }
        }
    }

    /// Perform the I/O that `update` leaves to the shell.
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::Save => save(model),
            Message::FileChanged => reload(model, Instant::now()),
            _ => {}
        }
    }
}

fn save(model: &mut Model) {
    let _scope = crate::perf::scope("app.save");
    match model.save() {
        Ok(path) => {
            crate::perf::log_event("app.save", path.display().to_string());
            model.show_toast(ToastLevel::Info, format!("Saved {}", path.display()));
        }
        Err(err) => {
            tracing::warn!(error = %err, "save failed");
            model.show_toast(ToastLevel::Error, format!("Save failed: {err}"));
        }
    }
}

fn reload(model: &mut Model, now: Instant) {
    match model.reload_from_store(now) {
        Ok(ReloadOutcome::Unchanged) => {}
        Ok(ReloadOutcome::Reloaded) => {
            model.show_toast(ToastLevel::Info, "Reloaded: file changed on disk");
        }
        Ok(ReloadOutcome::Conflict) => {
            model.show_toast(
                ToastLevel::Warning,
                "File changed on disk; keeping your unsaved edits",
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, "reload failed");
            model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
        }
    }
}
