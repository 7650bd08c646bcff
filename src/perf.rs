//! Opt-in timing scopes and a debug event log.
//!
//! `--perf` prints scope timings to stderr after the terminal is restored;
//! `--render-debug-log PATH` writes timestamped events (edits, renders,
//! frames) to a file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static DEBUG_LOG: LazyLock<Mutex<DebugLog>> = LazyLock::new(|| Mutex::new(DebugLog::new()));
static TIMINGS: LazyLock<Mutex<Vec<(&'static str, f64)>>> = LazyLock::new(|| Mutex::new(Vec::new()));

/// Records its lifetime when timing is enabled.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    start: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !is_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        lock(&TIMINGS).push((self.name, elapsed_ms));
    }
}

#[derive(Debug)]
struct DebugLog {
    start: Instant,
    writer: Option<BufWriter<File>>,
}

impl DebugLog {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            writer: None,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        start: Instant::now(),
    }
}

/// Drain recorded scope timings as `name: N.NN ms` lines.
pub fn take_report() -> Vec<String> {
    lock(&TIMINGS)
        .drain(..)
        .map(|(name, ms)| format!("[perf] {name}: {ms:.2} ms"))
        .collect()
}

/// Start (or stop, with `None`) writing debug events to `path`.
///
/// # Errors
///
/// Returns an error if the log file cannot be created.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut log = lock(&DEBUG_LOG);
    let Some(path) = path else {
        log.writer = None;
        return Ok(());
    };
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "markmate debug log start")?;
    writer.flush()?;
    log.start = Instant::now();
    log.writer = Some(writer);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    lock(&DEBUG_LOG).writer.is_some()
}

pub fn log_event(name: &str, detail: impl AsRef<str>) {
    let mut log = lock(&DEBUG_LOG);
    let elapsed_ms = log.start.elapsed().as_secs_f64() * 1000.0;
    let Some(writer) = log.writer.as_mut() else {
        return;
    };
    let _ = writeln!(writer, "[{elapsed_ms:>10.3} ms] {name}: {}", detail.as_ref());
    let _ = writer.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_scope_records_only_when_enabled() {
        set_enabled(false);
        drop(scope("perf.test.disabled"));
        set_enabled(true);
        drop(scope("perf.test.enabled"));
        set_enabled(false);

        let report = take_report();
        assert!(report.iter().any(|line| line.contains("perf.test.enabled")));
        assert!(!report.iter().any(|line| line.contains("perf.test.disabled")));
    }

    #[test]
    fn test_debug_log_path_enables_logging_and_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        set_debug_log_path(Some(temp_file.path())).unwrap();
        assert!(is_debug_log_enabled());
        log_event("test.event", "hello world");
        set_debug_log_path(None).unwrap();
        assert!(!is_debug_log_enabled());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("markmate debug log start"));
        assert!(content.contains("test.event: hello world"));
    }
}
