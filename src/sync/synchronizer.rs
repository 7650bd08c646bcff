use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use super::{
    DisplaySink, EditSignal, RenderRequest, RenderResult, RenderWorker, Renderer, StatusEvent,
    SyncConfig, SyncError, SynchronizerState,
};

/// Keeps a [`DisplaySink`] in step with a stream of [`EditSignal`]s.
///
/// The synchronizer is owned by the event loop thread and never blocks on
/// rendering: [`on_edit`](Self::on_edit) only records the edit and re-arms
/// the debounce timer. The loop drives time forward with
/// [`tick`](Self::tick) and collects finished renders with
/// [`poll_results`](Self::poll_results).
///
/// Scheduling rules:
/// - every edit restarts a single debounce timer
/// - when the timer fires, the newest content is rendered
/// - at most one render is in flight; while it runs, at most one more
///   request is queued, and it always carries the newest content
/// - [`force_render`](Self::force_render) skips the timer but still waits
///   for an in-flight render
/// - a result older than what is on display is dropped
pub struct PreviewSynchronizer<V, D> {
    config: SyncConfig,
    state: SynchronizerState,
    last_seen: Option<u64>,
    latest: Option<EditSignal>,
    in_flight: Option<u64>,
    queued: bool,
    failed_seq: Option<u64>,
    worker: RenderWorker<V>,
    display: D,
    status: Sender<StatusEvent>,
}

impl<V, D> PreviewSynchronizer<V, D>
where
    V: Send + 'static,
    D: DisplaySink<V>,
{
    /// Create a synchronizer and start its render worker.
    ///
    /// # Errors
    ///
    /// Returns an error if the render worker thread cannot be spawned.
    pub fn new<R>(
        config: SyncConfig,
        renderer: R,
        display: D,
        status: Sender<StatusEvent>,
    ) -> std::io::Result<Self>
    where
        R: Renderer<View = V>,
    {
        Ok(Self {
            config,
            state: SynchronizerState::default(),
            last_seen: None,
            latest: None,
            in_flight: None,
            queued: false,
            failed_seq: None,
            worker: RenderWorker::spawn(renderer)?,
            display,
            status,
        })
    }

    pub const fn config(&self) -> SyncConfig {
        self.config
    }

    pub const fn state(&self) -> SynchronizerState {
        self.state
    }

    pub const fn display(&self) -> &D {
        &self.display
    }

    pub const fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Sequence number of the render currently running, if any.
    pub const fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Whether a request is waiting for the in-flight render to finish.
    pub const fn has_queued(&self) -> bool {
        self.queued
    }

    /// Whether the most recent render attempt failed and nothing newer has
    /// been displayed since.
    pub const fn is_failing(&self) -> bool {
        self.failed_seq.is_some()
    }

    /// Whether the display lags the newest edit.
    pub fn is_behind(&self) -> bool {
        match (&self.latest, self.state.last_displayed) {
            (Some(latest), Some(shown)) => latest.seq() > shown,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// No timer armed, no render running, nothing queued.
    pub const fn is_idle(&self) -> bool {
        self.state.debounce_deadline.is_none() && self.in_flight.is_none() && !self.queued
    }

    /// When the event loop should call [`tick`](Self::tick) next.
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.state.debounce_deadline
    }

    /// Record a buffer mutation and restart the debounce timer.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StaleSignal`] if `signal` is not newer than every
    /// signal seen so far. The signal is ignored; nothing else changes.
    pub fn on_edit(&mut self, signal: EditSignal, now: Instant) -> Result<(), SyncError> {
        let seq = signal.seq();
        if let Some(last_seen) = self.last_seen
            && seq <= last_seen
        {
            warn!(seq, last_seen, "ignoring out-of-order edit signal");
            return Err(SyncError::StaleSignal { seq, last_seen });
        }

        self.last_seen = Some(seq);
        self.state.pending_seq = Some(seq);
        self.state.debounce_deadline = Some(now + self.config.debounce);
        self.latest = Some(signal);
        debug!(seq, "edit recorded, debounce armed");
        Ok(())
    }

    /// Fire the debounce timer if its deadline has passed.
    ///
    /// Returns `true` if the timer fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.state.debounce_deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }
        self.state.debounce_deadline = None;
        debug!(pending = ?self.state.pending_seq, "debounce elapsed");
        self.request_render();
        true
    }

    /// Render the newest content now, cancelling any pending debounce.
    ///
    /// Used for save and pane switches. If a render is already running the
    /// request is queued behind it.
    pub fn force_render(&mut self) {
        self.state.debounce_deadline = None;
        let Some(latest) = &self.latest else {
            return;
        };
        self.state.pending_seq = Some(latest.seq());
        debug!(seq = latest.seq(), "forced render");
        self.request_render();
    }

    /// Apply every finished render without blocking.
    ///
    /// Returns the number of results processed.
    pub fn poll_results(&mut self) -> usize {
        let mut processed = 0;
        while let Some(result) = self.worker.try_recv() {
            self.complete(result);
            processed += 1;
        }
        processed
    }

    /// Block up to `timeout` for one render to finish and apply it.
    ///
    /// Returns `false` on timeout.
    pub fn wait_for_result(&mut self, timeout: Duration) -> bool {
        let Some(result) = self.worker.recv_timeout(timeout) else {
            return false;
        };
        self.complete(result);
        true
    }

    /// Block until the in-flight render and any queued one have been
    /// applied. A pending debounce timer is left alone.
    ///
    /// Returns `false` if `timeout` ran out first.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.in_flight.is_some() || self.queued {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || !self.wait_for_result(remaining) {
                return false;
            }
        }
        true
    }

    /// Apply a render result to the display.
    ///
    /// Results older than the view on display are dropped. Failures keep the
    /// current view and are reported once on the status channel.
    pub fn on_render_result(&mut self, result: RenderResult<V>) {
        let seq = result.seq();
        if let Some(shown) = self.state.last_displayed
            && seq < shown
        {
            debug!(seq, shown, "discarding stale render result");
            return;
        }

        match result {
            RenderResult::Success { view, seq } => match self.display.show(view) {
                Ok(()) => {
                    self.state.last_displayed = Some(seq);
                    crate::perf::log_event("sync.display", format!("seq={seq}"));
                    if self.failed_seq.take().is_some() {
                        self.notify(StatusEvent::Recovered { seq });
                    }
                }
                Err(source) => {
                    warn!(seq, error = %source, "display rejected rendered preview");
                    self.failed_seq = Some(seq);
                    self.notify(StatusEvent::Failed(SyncError::DisplayFailure { seq, source }));
                }
            },
            RenderResult::Failure { detail, seq } => {
                debug!(seq, %detail, "render failed, keeping previous preview");
                self.failed_seq = Some(seq);
                self.notify(StatusEvent::Failed(SyncError::RenderFailure { seq, detail }));
            }
        }
    }

    fn complete(&mut self, result: RenderResult<V>) {
        if self.in_flight == Some(result.seq()) {
            self.in_flight = None;
        }
        self.on_render_result(result);
        if self.queued && self.in_flight.is_none() {
            self.dispatch();
        }
    }

    fn request_render(&mut self) {
        if self.state.pending_seq.is_none() {
            return;
        }
        if let Some(running) = self.in_flight {
            debug!(running, pending = ?self.state.pending_seq, "render in flight, queueing");
            self.queued = true;
            return;
        }
        self.dispatch();
    }

    fn dispatch(&mut self) {
        self.queued = false;
        let Some(latest) = &self.latest else {
            return;
        };
        let request = RenderRequest::from(latest);
        let seq = request.seq;
        self.state.pending_seq = None;
        match self.worker.submit(request) {
            Ok(()) => {
                debug!(seq, "render dispatched");
                self.in_flight = Some(seq);
            }
            Err(_) => {
                warn!(seq, "render worker unavailable");
                self.on_render_result(RenderResult::Failure {
                    detail: "render worker is not running".to_string(),
                    seq,
                });
            }
        }
    }

    fn notify(&self, event: StatusEvent) {
        // Nobody listening is fine; the preview itself is unaffected.
        let _ = self.status.send(event);
    }
}

impl<V, D: std::fmt::Debug> std::fmt::Debug for PreviewSynchronizer<V, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSynchronizer")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("last_seen", &self.last_seen)
            .field("in_flight", &self.in_flight)
            .field("queued", &self.queued)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
