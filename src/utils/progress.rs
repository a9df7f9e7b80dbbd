//! Progress indicators and step messages.
//!
//! Wraps `indicatif` with the crate's styling and the opt-out switches:
//! progress bars are hidden when `PS_UPDATER_NO_PROGRESS` is set or when the
//! run is quiet. [`StepPrinter`] prints the human-readable step messages of
//! the update flow, or sends them to the debug log when quiet.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ps_updater::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new_download(Some(2048));
//! progress.inc(1024);
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;
use tracing::debug;

use crate::constants::NO_PROGRESS_ENV;

/// Checks if progress bars should be disabled.
fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// A progress bar with consistent styling.
///
/// Operations on a hidden bar are silently ignored, so callers never need to
/// check whether progress output is enabled.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Byte-counting bar for a download.
    ///
    /// With an unknown `total` (no `Content-Length`) a spinner that counts
    /// bytes is shown instead.
    pub fn new_download(total: Option<u64>) -> Self {
        if is_progress_disabled() {
            return Self::hidden();
        }

        let bar = match total {
            Some(len) => {
                let bar = IndicatifBar::new(len);
                bar.set_style(download_style());
                bar
            }
            None => {
                let bar = IndicatifBar::new_spinner();
                bar.set_style(byte_spinner_style());
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };
        Self { inner: bar }
    }

    /// A bar that never draws.
    pub fn hidden() -> Self {
        Self { inner: IndicatifBar::hidden() }
    }

    /// Sets the prefix shown before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Advances the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn download_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

fn byte_spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{prefix:.bold.cyan} {spinner:.cyan} {bytes}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

/// Prints the step messages of an update run.
///
/// Messages go to stdout, or to the debug log instead when quiet, so a
/// verbose run never shows a step twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepPrinter {
    quiet: bool,
}

impl StepPrinter {
    /// Create a printer; `quiet` suppresses stdout output.
    pub const fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print one step message.
    pub fn step(&self, message: &str) {
        if self.quiet {
            debug!("{message}");
        } else {
            println!("{message}");
        }
    }

    /// Create a download bar, hidden when quiet.
    pub fn download_bar(&self, total: Option<u64>) -> ProgressBar {
        if self.quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_download(total)
        }
    }
}
