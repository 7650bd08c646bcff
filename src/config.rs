//! Saved defaults.
//!
//! Defaults are stored as command-line flag tokens, one or more per line,
//! in a global config file and an optional `.markmaterc` in the working
//! directory. Effective flags are `global ∪ local ∪ cli`, later sources
//! overriding earlier ones for valued options.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::sync::DEFAULT_DEBOUNCE_MS;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub perf: bool,
    pub debounce_ms: Option<u64>,
    pub wrap_width: Option<u16>,
    pub log_file: Option<PathBuf>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            perf: self.perf || other.perf,
            debounce_ms: other.debounce_ms.or(self.debounce_ms),
            wrap_width: other.wrap_width.or(self.wrap_width),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Debounce window after applying the default.
    pub fn effective_debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("markmate").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("markmate")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("markmate").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("markmate")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".markmaterc")
}

/// Load flags from `path`. A missing file yields empty flags.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// Write `flags` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# markmate defaults (saved with --save)".to_string()];
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(ms) = flags.debounce_ms {
        lines.push(format!("--debounce-ms {ms}"));
    }
    if let Some(width) = flags.wrap_width {
        lines.push(format!("--wrap-width {width}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// Remove the config file at `path` if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from raw argument tokens, ignoring everything else.
///
/// Accepts both `--flag value` and `--flag=value`. Values that fail to
/// parse are ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--debounce-ms" | "--wrap-width" | "--log-file" | "--render-debug-log"
        );
        let value = if takes_value && inline_value.is_none() {
            i += 1;
            tokens.get(i).map(String::as_str)
        } else {
            inline_value
        };

        match (name, value) {
            ("--watch", _) => flags.watch = true,
            ("--perf", _) => flags.perf = true,
            ("--debounce-ms", Some(v)) => flags.debounce_ms = v.parse().ok().or(flags.debounce_ms),
            ("--wrap-width", Some(v)) => flags.wrap_width = v.parse().ok().or(flags.wrap_width),
            ("--log-file", Some(v)) => flags.log_file = Some(PathBuf::from(v)),
            ("--render-debug-log", Some(v)) => flags.render_debug_log = Some(PathBuf::from(v)),
            _ => {}
        }
        i += 1;
    }
    flags
}
