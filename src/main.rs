//! MarkMate - A split-pane terminal markdown editor with live preview.
//!
//! # Usage
//!
//! ```bash
//! markmate notes.md
//! markmate --watch notes.md
//! markmate --debounce-ms 80 --wrap-width 72 notes.md
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use markmate::app::App;
use markmate::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    save_config_flags,
};
use markmate::perf;

/// A split-pane terminal markdown editor with live preview
#[derive(Parser, Debug)]
#[command(name = "markmate", version, about, long_about = None)]
struct Cli {
    /// Markdown file to edit; created on first save if missing
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Milliseconds of quiet typing before the preview re-renders
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Reload the file when it changes on disk
    #[arg(short, long)]
    watch: bool,

    /// Maximum preview wrap width in columns
    #[arg(long, value_name = "COLS")]
    wrap_width: Option<u16>,

    /// Write tracing logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print timing scopes after exit
    #[arg(long)]
    perf: bool,

    /// Write detailed edit/render/frame events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

impl Cli {
    fn flags(&self) -> ConfigFlags {
        ConfigFlags {
            watch: self.watch,
            perf: self.perf,
            debounce_ms: self.debounce_ms,
            wrap_width: self.wrap_width,
            log_file: self.log_file.clone(),
            render_debug_log: self.render_debug_log.clone(),
        }
    }
}

/// Install the tracing subscriber.
///
/// `MARKMATE_LOG` takes precedence over `RUST_LOG`; the default level is
/// `warn`. The terminal belongs to the UI, so without `--log-file` events
/// are dropped. The returned guard flushes the file writer on drop.
fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_env("MARKMATE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = cli.flags();

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let _log_guard = init_logging(effective.log_file.as_deref())?;
    tracing::debug!(?effective, "effective flags");

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MARKMATE_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        tracing::warn!(
            path = ?render_debug_log_path,
            error = %err,
            "failed to open render debug log"
        );
    }

    if let Some(file) = &cli.file
        && file.is_dir()
    {
        anyhow::bail!("{} is a directory", file.display());
    }

    let mut app = App::new(cli.file)
        .with_debounce_ms(effective.effective_debounce_ms())
        .with_watch(effective.watch)
        .with_wrap_width(effective.wrap_width);

    let result = app.run().context("Application error");

    if perf::is_enabled() {
        for line in perf::take_report() {
            eprintln!("{line}");
        }
    }
    result
}
