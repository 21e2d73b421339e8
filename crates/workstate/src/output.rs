//! Terminal output for workstate commands
//!
//! Status lines go to stdout, warnings and errors to stderr. Tracing logs are
//! separate and follow -v/-q.

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Keys shorter than this are padded so `kv` values line up.
const KEY_WIDTH: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Level::Success => style("✓").green(),
            Level::Info => style("ℹ").cyan(),
            Level::Warning => style("⚠").yellow(),
            Level::Error => style("✗").red(),
        }
        .bold()
    }

    fn is_problem(self) -> bool {
        matches!(self, Level::Warning | Level::Error)
    }
}

fn status_line(level: Level, msg: &str) -> String {
    format!("{} {}", level.marker(), msg)
}

fn emit(level: Level, msg: &str) {
    let line = status_line(level, msg);
    if level.is_problem() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

pub fn success(msg: &str) {
    emit(Level::Success, msg);
}

pub fn info(msg: &str) {
    emit(Level::Info, msg);
}

pub fn warning(msg: &str) {
    emit(Level::Warning, msg);
}

pub fn error(msg: &str) {
    emit(Level::Error, msg);
}

/// Section title, preceded by a blank line.
pub fn header(title: &str) {
    println!("\n{}", style(title).bold().underlined());
}

fn kv_line(key: &str, value: &str) -> String {
    let key = format!("{}:", key);
    format!("  {} {}", style(format!("{:<width$}", key, width = KEY_WIDTH)).dim(), value)
}

/// Indented `key: value` line; values of consecutive calls align.
pub fn kv(key: &str, value: &str) {
    println!("{}", kv_line(key, value));
}

pub fn dim(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Spinner for a network round trip; hidden when `visible` is false (`-q`).
pub fn spinner(msg: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(spinner_style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;

    #[test]
    fn test_problems_go_to_stderr() {
        assert!(Level::Warning.is_problem());
        assert!(Level::Error.is_problem());
        assert!(!Level::Success.is_problem());
        assert!(!Level::Info.is_problem());
    }

    #[test]
    fn test_status_line_markers() {
        assert_eq!(strip_ansi_codes(&status_line(Level::Success, "Saved")), "✓ Saved");
        assert_eq!(strip_ansi_codes(&status_line(Level::Error, "Failed")), "✗ Failed");
    }

    #[test]
    fn test_kv_values_align() {
        let short = strip_ansi_codes(&kv_line("Files", "3")).into_owned();
        let long = strip_ansi_codes(&kv_line("Project size", "1.0 KB")).into_owned();

        assert!(short.starts_with("  Files:"));
        assert_eq!(short.find('3'), long.find('1'));
    }

    #[test]
    fn test_long_keys_are_not_truncated() {
        let line = strip_ansi_codes(&kv_line("Configuration file", "/tmp/c.json")).into_owned();
        assert_eq!(line, "  Configuration file: /tmp/c.json");
    }

    #[test]
    fn test_hidden_spinner() {
        assert!(spinner("Fetching", false).is_hidden());
    }
}
