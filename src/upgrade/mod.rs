//! Update flow for the managed PanoptoSync installation.
//!
//! The updater lives next to the application it manages and replaces the
//! whole application tree whenever the upstream repository has a newer
//! commit. Versions are compared by commit timestamp only.
//!
//! # Architecture Overview
//!
//! - **[`VersionChecker`]**: reads the latest commit timestamp from the commit-list API
//! - **[`LocalStateStore`]**: persists the timestamp of the installed version
//! - **[`decision`]**: turns the two timestamps into an [`UpdateDecision`]
//! - **[`Fetcher`]**: downloads the upstream archive
//! - **[`Installer`]**: walks the install stages that swap the old tree for the new one
//! - **[`SelfUpdater`]**: runs everything and reports an [`UpdateStatus`]
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Version Check
//!    ├── GET commit list, read [0].created_at
//!    └── Read latest_commit_date.txt (if any)
//!
//! 2. Decision
//!    ├── panoptoSync.py missing        -> install
//!    ├── no local record               -> record remote timestamp only
//!    └── remote - local > threshold    -> update
//!
//! 3. Install (Downloaded -> Extracted -> Migrated -> Purged -> Moved -> Finalized)
//!    ├── Download and unpack the archive, delete it
//!    ├── Copy the updater and preserved user files into the new tree
//!    ├── Delete the cache folder and old root files
//!    ├── Move the new tree into place, skipping existing entries
//!    └── Remove the empty tree and record the new timestamp
//! ```
//!
//! There is no rollback. A failure stops the run at the stage that could not
//! be reached, and the managed application keeps whatever state that stage
//! left behind.
//!
//! # Error Handling
//!
//! Individual components return `anyhow::Result`; [`SelfUpdater::run`] folds
//! every error into [`UpdateStatus::Failed`]:
//!
//! ```rust,no_run
//! use ps_updater::upgrade::{SelfUpdater, UpdateStatus};
//! use ps_updater::upgrade::config::UpdaterConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = UpdaterConfig::load_for(std::path::Path::new("."), None).await?;
//! match SelfUpdater::new(config).run().await {
//!     UpdateStatus::Failed(failure) => failure.report().print(),
//!     UpdateStatus::Updated | UpdateStatus::Installed => println!("PanoptoSync is up to date now"),
//!     _ => {}
//! }
//! # Ok(())
//! # }
//! ```

/// Configuration of an update run.
pub mod config;
/// Version comparison rules.
pub mod decision;
/// Archive download.
pub mod fetcher;
/// Install stages.
pub mod installer;
/// Orchestration of a full update run.
pub mod self_updater;
/// Local version record.
pub mod state;
/// Remote version lookup.
pub mod version_check;


pub use decision::{UpdateDecision, UpdatePolicy, seconds_between};
pub use fetcher::Fetcher;
pub use installer::{InstallStage, Installer};
pub use self_updater::{SelfUpdater, UpdateFailure, UpdateStatus};
pub use state::LocalStateStore;
pub use version_check::{RemoteCommitInfo, VersionChecker};
