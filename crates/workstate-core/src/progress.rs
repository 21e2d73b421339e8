//! Progress reporting for archive and extraction passes.

use indicatif::{ProgressBar, ProgressStyle};

/// Per-entry progress bar, hidden when progress output is disabled.
#[derive(Debug, Clone)]
pub struct EntryProgress {
    bar: ProgressBar,
}

impl EntryProgress {
    /// Creates a progress reporter; `enabled = false` draws nothing.
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    /// Starts a pass over `total` entries.
    pub fn start(&self, total: u64, message: &str) {
        self.bar.set_length(total);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar.set_message(message.to_string());
    }

    /// Advances by one entry.
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Number of entries processed so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Clears the bar after a successful pass.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Leaves the bar where it stopped after a failed pass.
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl Default for EntryProgress {
    fn default() -> Self {
        Self::new(false)
    }
}
