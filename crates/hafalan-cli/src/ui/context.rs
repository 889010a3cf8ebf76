//! What the terminal can do, and how `hafalan` should print to it.
//!
//! Detection is split from the decision: [`Terminal::detect`] reads the
//! process environment once, and [`UiContext::resolve`] turns that snapshot
//! plus the global flags into output settings. Tests build a `Terminal` by
//! hand.

use std::io::IsTerminal;

use chrono_tz::Tz;

use super::mode::{OutputFormat, OutputMode};

const FALLBACK_WIDTH: usize = 80;

/// Snapshot of the process's terminal environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminal {
    pub stdout_tty: bool,
    pub stdin_tty: bool,
    /// `TERM=dumb`
    pub dumb: bool,
    /// `NO_COLOR` is set
    pub no_color: bool,
    /// `COLUMNS`, else the window size when stdout is a terminal
    pub columns: Option<usize>,
}

impl Terminal {
    pub fn detect() -> Self {
        let stdout_tty = std::io::stdout().is_terminal();
        Self {
            stdout_tty,
            stdin_tty: std::io::stdin().is_terminal(),
            dumb: std::env::var("TERM").map_or(false, |v| v == "dumb"),
            no_color: std::env::var_os("NO_COLOR").is_some(),
            columns: columns_env().or_else(|| if stdout_tty { window_columns() } else { None }),
        }
    }
}

/// Output settings shared by every renderer.
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Stdout is a terminal
    pub is_tty: bool,
    /// Confirmation and picker prompts may be shown
    pub can_prompt: bool,
    pub color: bool,
    /// Unicode symbols and rounded table borders; off with `--ascii`
    pub unicode: bool,
    /// Table width in columns
    pub width: usize,
    pub mode: OutputMode,
    /// Display timezone for timestamps; UTC when unset
    pub timezone: Option<Tz>,
}

impl UiContext {
    /// Settings for the current process. `json` and `format` come from the
    /// command's output flags, `no_color` and `ascii` from the global ones.
    pub fn from_env(json: bool, format: Option<OutputFormat>, no_color: bool, ascii: bool) -> Self {
        Self::resolve(Terminal::detect(), json, format, no_color, ascii)
    }

    /// Color needs a terminal that is not dumb and no opt-out from either
    /// `--no-color` or `NO_COLOR`. Prompts need both ends to be terminals
    /// and are never shown for JSON output.
    pub fn resolve(
        term: Terminal,
        json: bool,
        format: Option<OutputFormat>,
        no_color: bool,
        ascii: bool,
    ) -> Self {
        let mode = OutputMode::resolve(json, format, term.stdout_tty, term.dumb);
        Self {
            is_tty: term.stdout_tty,
            can_prompt: term.stdout_tty && term.stdin_tty && !mode.is_json(),
            color: term.stdout_tty && !term.dumb && !term.no_color && !no_color,
            unicode: !ascii,
            width: term.columns.unwrap_or(FALLBACK_WIDTH),
            mode,
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.can_prompt
    }
}

fn columns_env() -> Option<usize> {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|cols| cols.trim().parse::<usize>().ok())
        .filter(|&width| width > 0)
}

#[cfg(unix)]
fn window_columns() -> Option<usize> {
    use std::mem::MaybeUninit;

    let mut winsize = MaybeUninit::<libc::winsize>::uninit();
    // SAFETY: TIOCGWINSZ only writes into the provided winsize
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, winsize.as_mut_ptr()) };
    if result != 0 {
        return None;
    }
    // SAFETY: ioctl succeeded, so winsize is initialized
    let ws = unsafe { winsize.assume_init() };
    (ws.ws_col > 0).then_some(ws.ws_col as usize)
}

#[cfg(not(unix))]
fn window_columns() -> Option<usize> {
    None
}
