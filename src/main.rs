//! ps-updater CLI entry point
//!
//! Parses the command line, runs one update of the PanoptoSync installation,
//! and exits with status 0 whatever the outcome: the managed application keeps
//! working even when the updater fails.

use anyhow::Result;
use clap::Parser;
use ps_updater::cli;
use ps_updater::core::{ErrorReport, capture_backtraces_by_default};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    capture_backtraces_by_default();
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        ErrorReport::from_error(&e).print();
    }
    Ok(())
}
