//! Global constants used throughout the ps-updater codebase.
//!
//! Upstream endpoints, well-known file names inside the installation
//! directory, and the timing values the update flow relies on. They are the
//! defaults for [`UpdaterConfig`](crate::upgrade::config::UpdaterConfig); every one of
//! them can be overridden from the configuration file.

use std::time::Duration;

/// GitLab commit-list endpoint of the PanoptoSync project.
///
/// Only `[0].created_at` of the returned array is consumed.
pub const COMMITS_URL: &str = "https://gitlab.com/api/v4/projects/18406702/repository/commits";

/// Zip archive of the upstream default branch.
pub const ARCHIVE_URL: &str =
    "https://gitlab.com/Microeinstein/panopto-sync/-/archive/master/panopto-sync-master.zip";

/// Issue tracker users are asked to report unexpected errors to.
pub const ISSUES_URL: &str = "https://github.com/mario33881/panoptosync_updater/issues";

/// Upstream project page, shown in the intro banner.
pub const UPSTREAM_URL: &str = "https://gitlab.com/Microeinstein/panopto-sync";

/// License of the managed application.
pub const UPSTREAM_LICENSE_URL: &str =
    "https://gitlab.com/Microeinstein/panopto-sync/-/blob/master/LICENSE";

/// Main entry file of the managed application.
///
/// Its absence in the installation directory means "not installed".
pub const ENTRY_FILE: &str = "panoptoSync.py";

/// Plain-text file holding the timestamp of the last applied commit.
pub const STATE_FILE: &str = "latest_commit_date.txt";

/// Temporary name of the downloaded archive inside the installation directory.
pub const ARCHIVE_FILE: &str = "tmp_zipfile.zip";

/// Top-level folder produced by extracting the upstream archive.
pub const EXTRACT_FOLDER: &str = "panopto-sync-master";

/// Interpreter cache folder left behind by the managed application.
pub const CACHE_FOLDER: &str = "__pycache__";

/// Optional configuration file looked up in the installation directory.
pub const CONFIG_FILE: &str = "ps_updater.toml";

/// User session files carried forward across updates.
pub const PRESERVED_FILES: &[&str] = &["default.id", "default.cookies"];

/// Minimum remote-minus-local distance (in seconds) that counts as a new version.
///
/// Anything at or below this margin is treated as the same commit, which
/// absorbs clock skew and duplicate API timestamps.
pub const UPDATE_THRESHOLD_SECS: f64 = 30.0;

/// Total time allowed for the commit-list request (60 seconds).
pub const API_TIMEOUT: Duration = Duration::from_secs(60);

/// Time allowed to establish a connection to either endpoint (30 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest pause between two reads of the archive download before it is
/// abandoned. The download as a whole has no time limit.
pub const DOWNLOAD_STALL_SECS: u64 = 60;

/// User agent sent with API and archive requests.
pub const USER_AGENT: &str = concat!("ps-updater/", env!("CARGO_PKG_VERSION"));

/// Environment variable that disables progress bars when set.
pub const NO_PROGRESS_ENV: &str = "PS_UPDATER_NO_PROGRESS";
