use std::sync::Arc;
use std::time::{Duration, Instant};

use super::SyncError;

/// Debounce window applied when no configuration overrides it.
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

/// Full buffer content at one point in time.
///
/// Emitted by the editor on every mutation. Sequence numbers grow strictly;
/// gaps are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSignal {
    seq: u64,
    content: Arc<str>,
}

impl EditSignal {
    pub fn new(seq: u64, content: impl Into<Arc<str>>) -> Self {
        Self {
            seq,
            content: content.into(),
        }
    }

    pub const fn seq(&self) -> u64 {
        self.seq
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Content handed to the render worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub seq: u64,
    pub content: Arc<str>,
}

impl From<&EditSignal> for RenderRequest {
    fn from(signal: &EditSignal) -> Self {
        Self {
            seq: signal.seq,
            content: Arc::clone(&signal.content),
        }
    }
}

/// Outcome of rendering one [`RenderRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult<V> {
    Success { view: V, seq: u64 },
    Failure { detail: String, seq: u64 },
}

impl<V> RenderResult<V> {
    pub const fn seq(&self) -> u64 {
        match self {
            Self::Success { seq, .. } | Self::Failure { seq, .. } => *seq,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Bookkeeping the synchronizer exposes for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynchronizerState {
    /// Sequence number of the view currently on display.
    pub last_displayed: Option<u64>,
    /// Newest edit that has not been handed to the renderer yet.
    pub pending_seq: Option<u64>,
    /// When the debounce timer fires, if armed.
    pub debounce_deadline: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period after the last edit before a render starts.
    pub debounce: Duration,
}

impl SyncConfig {
    pub const fn with_debounce_ms(ms: u64) -> Self {
        Self {
            debounce: Duration::from_millis(ms),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::with_debounce_ms(DEFAULT_DEBOUNCE_MS)
    }
}

/// Notifications for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A render or display step failed; the preview is now behind the buffer.
    Failed(SyncError),
    /// A render succeeded after one or more failures.
    Recovered { seq: u64 },
}
