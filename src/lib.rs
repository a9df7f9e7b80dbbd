//! ps-updater - update tool for PanoptoSync
//!
//! Keeps a PanoptoSync installation current by comparing the timestamp of the
//! latest upstream commit with the one recorded locally and, when the remote is
//! newer, replacing the installation with the upstream archive while carrying
//! the user's session files forward.
//!
//! # Architecture Overview
//!
//! The installation directory holds the managed application, the updater
//! executable, and a few files the updater owns:
//! - `latest_commit_date.txt` records the installed version (a commit timestamp)
//! - `default.id` and `default.cookies` are user files preserved across updates
//! - `ps_updater.toml` optionally overrides the defaults
//!
//! A run is a single pass: check, decide, and (when needed) download and
//! install. Every failure is reported as a diagnostic block and the process
//! still exits successfully, because the managed application keeps working.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line flags, banner, and reporting
//! - [`constants`] - Upstream endpoints and well-known file names
//! - [`core`] - Error types and the diagnostic report
//! - [`upgrade`] - Version check, decision, download, and install stages
//! - [`utils`] - File system helpers and progress output
//!
//! # Example
//!
//! ```rust,no_run
//! use ps_updater::upgrade::config::UpdaterConfig;
//! use ps_updater::upgrade::{SelfUpdater, UpdateStatus};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpdaterConfig::load_for(std::path::Path::new("/opt/panopto-sync"), None).await?;
//! if let UpdateStatus::Failed(failure) = SelfUpdater::new(config).run().await {
//!     failure.report().print();
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod upgrade;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
