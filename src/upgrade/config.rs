use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::constants;
use crate::core::UpdaterError;

/// Runtime configuration for one update run.
///
/// `UpdaterConfig` names the upstream endpoints, the files the updater manages
/// inside the installation directory, and the knobs that used to be a global
/// debug switch (`step_delay_ms`, `force`). Values come from the optional
/// `ps_updater.toml` next to the updater, with CLI flags layered on top.
///
/// # TOML Example
///
/// ```toml
/// commits_url = "https://gitlab.com/api/v4/projects/18406702/repository/commits"
/// preserved_files = ["default.id", "default.cookies"]
/// threshold_secs = 30.0
/// step_delay_ms = 0
/// replace_directories = false
/// download_stall_secs = 60
/// ```
///
/// # Examples
///
/// ```rust,no_run
/// use ps_updater::upgrade::config::UpdaterConfig;
///
/// let config = UpdaterConfig::new("/opt/panopto-sync");
/// assert_eq!(config.state_path().file_name().unwrap(), "latest_commit_date.txt");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Directory containing the updater and the managed application.
    #[serde(skip)]
    pub install_dir: PathBuf,

    /// Path of the running updater executable, kept through the purge step.
    #[serde(skip)]
    pub updater_path: Option<PathBuf>,

    /// Suppress step messages and progress bars.
    #[serde(skip)]
    pub quiet: bool,

    /// Commit-list endpoint; `[0].created_at` is the latest version marker.
    #[serde(default = "default_commits_url")]
    pub commits_url: String,

    /// Zip archive of the upstream default branch.
    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    /// File whose presence means the application is installed.
    #[serde(default = "default_entry_file")]
    pub entry_file: String,

    /// File holding the last applied commit timestamp.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Name of the downloaded archive inside the installation directory.
    #[serde(default = "default_archive_file")]
    pub archive_file: String,

    /// Top-level folder produced by extracting the archive.
    #[serde(default = "default_extract_folder")]
    pub extract_folder: String,

    /// Transient cache folder removed before old files are purged.
    #[serde(default = "default_cache_folder")]
    pub cache_folder: String,

    /// User files copied into the new tree before the purge.
    #[serde(default = "default_preserved_files")]
    pub preserved_files: Vec<String>,

    /// Remote must be newer than local by more than this many seconds.
    ///
    /// # Default: `30.0`
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: f64,

    /// Pause between install steps in milliseconds, for watching the
    /// installation directory while it changes.
    ///
    /// # Default: `0`
    #[serde(default)]
    pub step_delay_ms: u64,

    /// Also remove root subdirectories that the new tree replaces.
    ///
    /// # Default: `false`
    ///
    /// When disabled, a stale subdirectory with the same name as one in the
    /// new tree is kept as-is because the move step skips existing entries.
    #[serde(default)]
    pub replace_directories: bool,

    /// Download and install even when the local version is current.
    #[serde(default)]
    pub force: bool,

    /// Abandon the archive download when no data arrives for this many
    /// seconds. The download as a whole is not time-limited.
    ///
    /// # Default: `60`
    #[serde(default = "default_download_stall_secs")]
    pub download_stall_secs: u64,
}

fn default_commits_url() -> String {
    constants::COMMITS_URL.to_string()
}

fn default_archive_url() -> String {
    constants::ARCHIVE_URL.to_string()
}

fn default_entry_file() -> String {
    constants::ENTRY_FILE.to_string()
}

fn default_state_file() -> String {
    constants::STATE_FILE.to_string()
}

fn default_archive_file() -> String {
    constants::ARCHIVE_FILE.to_string()
}

fn default_extract_folder() -> String {
    constants::EXTRACT_FOLDER.to_string()
}

fn default_cache_folder() -> String {
    constants::CACHE_FOLDER.to_string()
}

fn default_preserved_files() -> Vec<String> {
    constants::PRESERVED_FILES.iter().map(|name| (*name).to_string()).collect()
}

fn default_threshold_secs() -> f64 {
    constants::UPDATE_THRESHOLD_SECS
}

fn default_download_stall_secs() -> u64 {
    constants::DOWNLOAD_STALL_SECS
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            install_dir: PathBuf::new(),
            updater_path: None,
            quiet: false,
            commits_url: default_commits_url(),
            archive_url: default_archive_url(),
            entry_file: default_entry_file(),
            state_file: default_state_file(),
            archive_file: default_archive_file(),
            extract_folder: default_extract_folder(),
            cache_folder: default_cache_folder(),
            preserved_files: default_preserved_files(),
            threshold_secs: default_threshold_secs(),
            step_delay_ms: 0,
            replace_directories: false,
            force: false,
            download_stall_secs: default_download_stall_secs(),
        }
    }
}

impl UpdaterConfig {
    /// Default configuration rooted at `install_dir`.
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            ..Self::default()
        }
    }

    /// Load the configuration for `install_dir`.
    ///
    /// Reads `explicit` when given, otherwise `<install_dir>/ps_updater.toml`
    /// if it exists, otherwise falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the resulting configuration fails [`validate`](Self::validate).
    pub async fn load_for(install_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = install_dir.join(constants::CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = match path {
            Some(path) => Self::load_from(&path).await?,
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };
        config.install_dir = install_dir.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without validating it.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        debug!("Loaded configuration from {}", path.display());
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration from {}", path.display()))
    }

    /// Check values that would make the update flow misbehave.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_secs.is_finite() || self.threshold_secs < 0.0 {
            return Err(UpdaterError::ConfigError {
                message: format!(
                    "threshold_secs must be a non-negative number, got {}",
                    self.threshold_secs
                ),
            }
            .into());
        }

        if self.download_stall_secs == 0 {
            return Err(UpdaterError::ConfigError {
                message: "download_stall_secs must be at least 1".to_string(),
            }
            .into());
        }

        let plain_names = [
            ("entry_file", &self.entry_file),
            ("state_file", &self.state_file),
            ("archive_file", &self.archive_file),
            ("extract_folder", &self.extract_folder),
            ("cache_folder", &self.cache_folder),
        ];
        for (field, value) in plain_names.into_iter().chain(
            self.preserved_files.iter().map(|name| ("preserved_files", name)),
        ) {
            if !is_plain_name(value) {
                return Err(UpdaterError::ConfigError {
                    message: format!("{field} must be a plain file name, got '{value}'"),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Builder-style override of [`force`](Self::force).
    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Builder-style override of the running updater's path.
    #[must_use]
    pub fn with_updater_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.updater_path = Some(path.into());
        self
    }

    /// Pause inserted between install steps.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Longest pause between reads of the archive download.
    pub fn download_stall_timeout(&self) -> Duration {
        Duration::from_secs(self.download_stall_secs)
    }

    /// Path of the local version record.
    pub fn state_path(&self) -> PathBuf {
        self.install_dir.join(&self.state_file)
    }

    /// Path the archive is downloaded to.
    pub fn archive_path(&self) -> PathBuf {
        self.install_dir.join(&self.archive_file)
    }

    /// Folder holding the new tree after extraction.
    pub fn extract_path(&self) -> PathBuf {
        self.install_dir.join(&self.extract_folder)
    }

    /// Path of the managed application's entry file.
    pub fn entry_path(&self) -> PathBuf {
        self.install_dir.join(&self.entry_file)
    }

    /// Whether the managed application is present.
    pub fn is_installed(&self) -> bool {
        self.entry_path().is_file()
    }

    /// File name of the updater executable when it lives directly in the
    /// installation directory.
    pub fn updater_file_name(&self) -> Option<&std::ffi::OsStr> {
        let path = self.updater_path.as_deref()?;
        let parent = path.parent()?;
        if same_dir(parent, &self.install_dir) {
            path.file_name()
        } else {
            None
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
