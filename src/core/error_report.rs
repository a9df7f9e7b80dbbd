//! Diagnostic report printed when an update attempt fails unexpectedly.
//!
//! The report is meant to be copied verbatim into a bug report, so it is
//! rendered as plain text with the backtrace and error chain inside a fenced
//! block. It always carries the error's type name and message unchanged.

use crate::constants::ISSUES_URL;
use crate::core::error::error_type_name;
use colored::Colorize;
use std::backtrace::BacktraceStatus;
use std::fmt;

const RULE: &str = "------------------------------";

/// Make anyhow capture a backtrace for every error unless the user already
/// chose a setting through `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE`.
///
/// Must run before the first error is created: the standard library reads
/// these variables once per process.
pub fn capture_backtraces_by_default() {
    if std::env::var_os("RUST_BACKTRACE").is_none()
        && std::env::var_os("RUST_LIB_BACKTRACE").is_none()
    {
        // SAFETY: called at the start of main before any other thread exists
        unsafe {
            std::env::set_var("RUST_LIB_BACKTRACE", "1");
        }
    }
}

/// Human-readable diagnostic block for a failed run.
///
/// # Examples
///
/// ```rust,no_run
/// use ps_updater::core::ErrorReport;
///
/// let error = anyhow::anyhow!("connection reset");
/// let report = ErrorReport::from_error(&error);
/// assert!(report.to_string().contains("connection reset"));
/// ```
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// Top-level message of the error
    pub message: String,
    /// Type name as computed by [`error_type_name`]
    pub type_name: String,
    /// Messages of the underlying causes, outermost first (excluding `message`)
    pub causes: Vec<String>,
    /// Rendered backtrace, or `None` when it was not captured
    pub backtrace: Option<String>,
}

impl ErrorReport {
    /// Build a report from an [`anyhow::Error`].
    #[must_use]
    pub fn from_error(error: &anyhow::Error) -> Self {
        let backtrace = error.backtrace();
        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            message: error.to_string(),
            type_name: error_type_name(error),
            causes: error.chain().skip(1).map(ToString::to_string).collect(),
            backtrace,
        }
    }

    /// Print the report to stdout with a highlighted header line.
    pub fn print(&self) {
        println!("{RULE}");
        println!("{} {}", "An unexpected error occurred:".red().bold(), self.message);
        print!("{}", self.body());
    }

    /// Everything below the header line.
    fn body(&self) -> String {
        let mut out = String::new();
        out.push_str("```\n");
        out.push_str("Traceback:\n\n");
        match &self.backtrace {
            Some(trace) => {
                out.push_str(trace.trim_end());
                out.push('\n');
            }
            None => out.push_str("(backtrace not captured, re-run with RUST_BACKTRACE=1)\n"),
        }
        out.push('\n');
        for (depth, cause) in self.causes.iter().enumerate() {
            out.push_str(&format!("  {depth}: caused by: {cause}\n"));
        }
        if !self.causes.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("{}: {}\n", self.type_name, self.message));
        out.push_str("```\n");
        out.push_str(&format!(
            "Please copy and paste this full message (from the intro banner to the next line) and report it here: {ISSUES_URL}\n"
        ));
        out.push_str("> After signing up/logging in follow this tutorial: https://docs.github.com/en/issues/tracking-your-work-with-issues/creating-an-issue#creating-an-issue-from-a-repository\n");
        out.push_str("\nNOTE: This error was thrown by the Update tool. PanoptoSync should still work!\n");
        out
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "An unexpected error occurred: {}", self.message)?;
        write!(f, "{}", self.body())
    }
}
