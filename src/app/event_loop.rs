use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, update};
use crate::store::{FileStore, PersistenceStore};
use crate::sync::SyncConfig;
use crate::watcher::FileWatcher;

/// Longest the loop sleeps when nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Poll interval while a render is running on the worker.
const RENDER_POLL: Duration = Duration::from_millis(16);
/// How long shutdown waits for an in-flight render.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the editor until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");

        let store = self.file_path.as_ref().map(FileStore::new);
        let source = match &store {
            Some(store) => store
                .load()
                .with_context(|| format!("Failed to open {}", store.location().display()))?,
            None => None,
        };
        let is_new = source.is_none();
        let source = source.unwrap_or_else(|| super::WELCOME_MARKDOWN.to_string());

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; markmate requires an interactive terminal")?;
        let _ = execute!(stdout(), EnableBracketedPaste);
        let size = terminal.size()?;

        let result = self
            .build_model(&source, (size.width, size.height), store, is_new)
            .and_then(|model| Self::event_loop(&mut terminal, model));

        let _ = execute!(stdout(), DisableBracketedPaste);
        ratatui::restore();
        result
    }

    fn build_model(
        &self,
        source: &str,
        terminal_size: (u16, u16),
        store: Option<FileStore>,
        is_new: bool,
    ) -> Result<Model> {
        let config = SyncConfig::with_debounce_ms(self.debounce_ms);
        let mut model = Model::new(source, terminal_size, config, self.wrap_width)
            .context("Failed to start the preview renderer")?;
        if let Some(store) = store {
            if is_new {
                model.show_toast(
                    super::ToastLevel::Info,
                    format!("New file: {}", store.location().display()),
                );
            }
            model = model.with_store(Box::new(store));
        }
        model.watch_enabled = self.watch_enabled;
        crate::perf::log_event(
            "init.layout",
            format!(
                "terminal={}x{} wrap_width={} debounce_ms={}",
                terminal_size.0,
                terminal_size.1,
                model.current_wrap_width(),
                self.debounce_ms
            ),
        );
        Ok(model)
    }

    fn event_loop(terminal: &mut DefaultTerminal, mut model: Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(100);
        let mut file_watcher = if model.watch_enabled {
            Self::make_file_watcher(&mut model)
        } else {
            None
        };
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            let now = Instant::now();
            if model.expire_toast(now) {
                needs_render = true;
            }

            if model.sync.tick(now) {
                crate::perf::log_event("sync.tick", format!("frame={frame_idx}"));
            }
            if model.sync.poll_results() > 0 {
                needs_render = true;
            }
            if model.drain_status_events() {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                crate::perf::log_event(
                    "event.resize.apply",
                    format!("frame={frame_idx} width={width} height={height}"),
                );
                model = update(model, Message::Resize(width, height));
                needs_render = true;
            }

            if model.watch_enabled
                && file_watcher
                    .as_mut()
                    .is_some_and(|watcher| watcher.take_change_ready(now))
            {
                model = Self::dispatch(model, Message::FileChanged);
                needs_render = true;
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(&model, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                needs_render = false;
            }

            if model.should_quit {
                break;
            }

            let timeout = Self::poll_timeout(
                &model,
                file_watcher.as_ref(),
                resize_debouncer.is_pending(),
                Instant::now(),
            );
            if event::poll(timeout)? {
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if let Some(msg) =
                    Self::handle_event(&event::read()?, &model, event_ms, &mut resize_debouncer)
                {
                    model = Self::dispatch(model, msg);
                }
                needs_render = true;

                // Coalesce key repeat bursts into a single frame.
                let mut drained = 0_u32;
                while event::poll(Duration::ZERO)? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Some(msg) =
                        Self::handle_event(&event::read()?, &model, drain_ms, &mut resize_debouncer)
                    {
                        drained += 1;
                        model = Self::dispatch(model, msg);
                    }
                }
                if drained > 0 {
                    crate::perf::log_event(
                        "event.drain",
                        format!("frame={frame_idx} drained={drained}"),
                    );
                }
            }
        }

        // Leave the worker idle before the synchronizer is dropped.
        model.sync.settle(SHUTDOWN_GRACE);
        Ok(())
    }

    fn dispatch(model: Model, msg: Message) -> Model {
        crate::perf::log_event("event.message", format!("msg={msg:?}"));
        let side_msg = msg.clone();
        let mut model = update(model, msg);
        Self::handle_message_side_effects(&mut model, &side_msg);
        model
    }

    /// Sleep until the next scheduled piece of work, or an input event.
    fn poll_timeout(
        model: &Model,
        watcher: Option<&FileWatcher>,
        resize_pending: bool,
        now: Instant,
    ) -> Duration {
        let mut timeout = IDLE_POLL;
        if model.sync.in_flight().is_some() || resize_pending {
            timeout = RENDER_POLL;
        }
        let deadlines = [
            model.sync.next_deadline(),
            model.toast_deadline(),
            watcher.and_then(FileWatcher::next_deadline),
        ];
        for deadline in deadlines.into_iter().flatten() {
            timeout = timeout.min(deadline.saturating_duration_since(now));
        }
        timeout
    }
}
