//! Command-line interface for ps-updater.
//!
//! The binary takes no subcommand: each invocation performs one update run
//! for the installation directory (by default the directory holding the
//! executable) and always exits with status 0. Failures are shown as a
//! diagnostic report meant to be pasted into a bug report.
//!
//! # Options
//!
//! - `--dir` - Installation directory to manage
//! - `--config` - Path to a custom `ps_updater.toml`
//! - `--check` - Only report whether an update is available
//! - `--force` - Reinstall even when the installed version is current
//! - `--step-delay` - Pause between install steps, in milliseconds
//! - `--no-progress` - Disable progress bars
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress everything except the error report
//!
//! # Example
//!
//! ```bash
//! # Update the installation next to the executable
//! ps-updater
//!
//! # Watch a slowed-down update of another directory
//! ps-updater --dir ~/panopto-sync --force --step-delay 5000 --verbose
//! ```


use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::constants::{NO_PROGRESS_ENV, UPSTREAM_LICENSE_URL};
use crate::core::ErrorReport;
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::{SelfUpdater, UpdateDecision, UpdateStatus};

const BANNER_RULE: &str = "==============================";

/// Process-level settings derived from the command-line flags.
///
/// Separates what the flags mean for the process (log level, environment)
/// from what they mean for the update run, so tests can inspect one without
/// triggering the other.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive, `None` to leave logging off.
    pub log_level: Option<String>,

    /// Whether progress bars are disabled for this process.
    pub no_progress: bool,
}

impl CliConfig {
    /// Creates a new `CliConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export settings that library code reads from the environment.
    pub fn apply_to_env(&self) {
        if self.no_progress {
            // SAFETY: called once at startup before any other thread reads the environment
            unsafe {
                std::env::set_var(NO_PROGRESS_ENV, "1");
            }
        }
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over the level chosen by the flags. Logs go
    /// to stderr so step messages on stdout stay readable.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Keeps a PanoptoSync installation up to date.
#[derive(Parser, Debug)]
#[command(
    name = "ps-updater",
    about = "Update tool for PanoptoSync",
    version,
    long_about = "Checks the PanoptoSync repository for a newer commit and, when one exists, replaces the installation with the latest version while keeping your id and cookies files."
)]
pub struct Cli {
    /// Installation directory (defaults to the directory of this executable)
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Path to a custom configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only check whether an update is available
    #[arg(long)]
    check: bool,

    /// Reinstall even if the installed version is current
    #[arg(long)]
    force: bool,

    /// Pause between install steps, in milliseconds
    #[arg(long, value_name = "MS")]
    step_delay: Option<u64>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,

    /// Enable debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print the error report, if any
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Run the updater with the parsed flags.
    ///
    /// Errors are reported to the user here and never returned as failures of
    /// the process.
    pub async fn execute(self) -> Result<()> {
        let cli_config = self.build_config();
        cli_config.apply_to_env();
        cli_config.init_logging();

        if !self.quiet {
            print_intro();
        }

        match self.run().await {
            Ok(Some(UpdateStatus::Failed(failure))) => {
                debug!("Update run failed: {failure}");
                failure.report().print();
            }
            Ok(_) => {}
            Err(error) => ErrorReport::from_error(&error).print(),
        }

        if !self.quiet {
            println!("{BANNER_RULE}");
            println!();
        }
        Ok(())
    }

    /// Derive process-level settings from the flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
        }
    }

    /// Resolve the installation directory.
    pub fn install_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        exe.parent()
            .map(std::path::Path::to_path_buf)
            .context("The running executable has no parent directory")
    }

    /// Load the configuration file and apply the flags on top of it.
    pub async fn load_config(&self) -> Result<UpdaterConfig> {
        let install_dir = self.install_dir()?;
        let mut config = UpdaterConfig::load_for(&install_dir, self.config.as_deref()).await?;

        if let Ok(exe) = std::env::current_exe() {
            config = config.with_updater_path(exe);
        }
        if self.force {
            config = config.force(true);
        }
        if let Some(ms) = self.step_delay {
            config.step_delay_ms = ms;
        }
        config.quiet = self.quiet;

        debug!("Using installation directory {}", config.install_dir.display());
        Ok(config)
    }

    /// `Ok(None)` for `--check` runs, the run's status otherwise.
    async fn run(&self) -> Result<Option<UpdateStatus>> {
        let updater = SelfUpdater::new(self.load_config().await?);

        if self.check {
            let decision = updater.check().await?;
            if !self.quiet {
                print_decision(&decision);
            }
            return Ok(None);
        }

        Ok(Some(updater.run().await))
    }
}

fn print_intro() {
    println!("PanoptoSync was coded by Microeinstein (https://gitlab.com/Microeinstein)");
    println!("Update tool was coded by mario33881 (https://github.com/mario33881)");
    println!();
    println!("PanoptoSync was released with the \"GNU General Public License v3.0\":");
    println!("You can find its license files here: {UPSTREAM_LICENSE_URL}");
    println!(
        "or inside this current folder (the license file will be downloaded together with PanoptoSync)"
    );
    println!("{BANNER_RULE}");
    println!("Checking if an update is available...");
}

fn print_decision(decision: &UpdateDecision) {
    let message = match decision {
        UpdateDecision::Install => {
            "PanoptoSync is not installed, running the updater will download it"
        }
        UpdateDecision::RecordOnly => {
            "No version recorded yet, running the updater will record the latest one"
        }
        UpdateDecision::Update { .. } => "A new PanoptoSync update is available",
        UpdateDecision::UpToDate { .. } => "There are no PanoptoSync updates available",
    };
    if decision.requires_download() {
        println!("{} ({decision})", message.yellow());
    } else {
        println!("{}", message.green());
    }
}
