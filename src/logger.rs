//! Terminal output.
//!
//! - `log!("module"; ...)` prints `[module] message` with a coloured prefix
//! - `debug!` does the same, only under `--verbose`
//! - [`WatchStatus`] keeps the watch loop's result in one block that each
//!   new result overwrites
//!
//! ```ignore
//! log!("css"; "completed ({} files)", n);
//! debug!("watch"; "modified: {}", path.display());
//! ```

use std::io::{Write, stdout};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crossterm::cursor::MoveUp;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use owo_colors::{OwoColorize, Stream};
use parking_lot::Mutex;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// `log!` that only prints under `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print one `[module] message` line.
pub fn log(module: &str, message: &str) {
    let prefix = prefix(module);
    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Servers blue, watcher green, errors red, commands magenta, tasks yellow.
///
/// Honours `--color` through `owo_colors::set_override`.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    let kind = module.to_ascii_lowercase();
    tag.if_supports_color(Stream::Stdout, |tag| match kind.as_str() {
        "serve" | "reload" => tag.bright_blue().bold().to_string(),
        "watch" => tag.bright_green().bold().to_string(),
        "error" | "warning" => tag.bright_red().bold().to_string(),
        "build" | "dev" | "config" => tag.bright_magenta().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    })
    .to_string()
}

/// Wall-clock `HH:MM:SS` (UTC).
fn clock() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60)
}

/// Rebuild result block of the watch loop.
///
/// Each `success`/`error` erases the previous block, so the terminal shows
/// only the latest outcome.
pub struct WatchStatus {
    /// Height of the block printed last.
    lines: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { lines: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.show(&"✓".if_supports_color(Stream::Stdout, |s| s.green()).to_string(), message);
    }

    /// `summary` on the first line, `detail` (may be empty) below it.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = match detail {
            "" => summary.to_string(),
            detail => format!("{summary}\n{detail}"),
        };
        self.show(&"✗".if_supports_color(Stream::Stdout, |s| s.red()).to_string(), &message);
    }

    /// Stop tracking the current block; the next one prints below it.
    pub fn detach(&mut self) {
        self.lines = 0;
    }

    fn show(&mut self, symbol: &str, message: &str) {
        let mut out = stdout().lock();
        if let Ok(up) = u16::try_from(self.lines)
            && up > 0
        {
            execute!(out, MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock());
        let stamp = stamp.if_supports_color(Stream::Stdout, |s| s.dimmed());
        writeln!(out, "{stamp} {symbol} {message}").ok();
        out.flush().ok();

        self.lines = height(message);
    }
}

/// Terminal lines taken by `message`.
fn height(message: &str) -> usize {
    message.lines().count().max(1)
}

pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

pub fn status_detach() {
    WATCH_STATUS.lock().detach();
}
