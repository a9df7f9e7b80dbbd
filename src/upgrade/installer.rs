//! Ordered install sequence that replaces the managed application in place.
//!
//! An install walks through [`InstallStage`] in order. Each stage either
//! completes or aborts the run; there is no rollback, so a failure leaves the
//! installation directory as the failed stage found it and the stage is
//! reported through [`UpdateFailure`].

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::constants::CONFIG_FILE;
use crate::core::UpdaterError;
use crate::upgrade::UpdateFailure;
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::fetcher::Fetcher;
use crate::upgrade::state::LocalStateStore;
use crate::utils::fs::{self as fs_utils, MoveOutcome};
use crate::utils::progress::StepPrinter;

/// Stages of an install, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstallStage {
    /// The archive is on disk.
    Downloaded,
    /// The archive was unpacked and deleted.
    Extracted,
    /// The updater and preserved user files were copied into the new tree.
    Migrated,
    /// Old files were removed from the installation directory.
    Purged,
    /// The new tree was moved into the installation directory.
    Moved,
    /// The empty tree was removed and the new version recorded.
    Finalized,
}

impl InstallStage {
    /// The stage following this one, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Downloaded => Some(Self::Extracted),
            Self::Extracted => Some(Self::Migrated),
            Self::Migrated => Some(Self::Purged),
            Self::Purged => Some(Self::Moved),
            Self::Moved => Some(Self::Finalized),
            Self::Finalized => None,
        }
    }

    /// The operation that reaches this stage, for messages.
    pub const fn action(self) -> &'static str {
        match self {
            Self::Downloaded => "download",
            Self::Extracted => "extraction",
            Self::Migrated => "migration of preserved files",
            Self::Purged => "removal of old files",
            Self::Moved => "move of new files",
            Self::Finalized => "finalization",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Downloaded => "Downloaded",
            Self::Extracted => "Extracted",
            Self::Migrated => "Migrated",
            Self::Purged => "Purged",
            Self::Moved => "Moved",
            Self::Finalized => "Finalized",
        };
        f.write_str(name)
    }
}

/// Runs the install sequence for one update.
pub struct Installer<'a> {
    config: &'a UpdaterConfig,
    printer: StepPrinter,
}

impl<'a> Installer<'a> {
    /// Installer working on `config.install_dir`.
    pub const fn new(config: &'a UpdaterConfig, printer: StepPrinter) -> Self {
        Self {
            config,
            printer,
        }
    }

    /// Download the archive and walk every stage up to [`InstallStage::Finalized`].
    ///
    /// `remote_timestamp` is written verbatim to the version record in the
    /// last stage.
    ///
    /// # Errors
    ///
    /// Returns an [`UpdateFailure`] naming the stage that could not be reached.
    pub async fn install(
        &self,
        fetcher: &Fetcher,
        remote_timestamp: &str,
    ) -> Result<(), UpdateFailure> {
        let mut next = Some(InstallStage::Downloaded);
        while let Some(stage) = next {
            self.enter(stage, fetcher, remote_timestamp)
                .await
                .map_err(|error| UpdateFailure::at(stage, error))?;
            debug!("Install stage reached: {stage}");
            next = stage.next();
        }

        self.printer.step("\nDone.\n");
        Ok(())
    }

    async fn enter(
        &self,
        stage: InstallStage,
        fetcher: &Fetcher,
        remote_timestamp: &str,
    ) -> Result<()> {
        match stage {
            InstallStage::Downloaded => self.download(fetcher).await,
            InstallStage::Extracted => self.extract().await,
            InstallStage::Migrated => self.migrate().await,
            InstallStage::Purged => self.purge().await,
            InstallStage::Moved => self.move_new_files().await,
            InstallStage::Finalized => self.finalize(remote_timestamp).await,
        }
    }

    async fn pause(&self) {
        let delay = self.config.step_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    async fn download(&self, fetcher: &Fetcher) -> Result<()> {
        self.printer.step("Downloading zip file...");
        let printer = self.printer;
        fetcher
            .download_to(&self.config.archive_path(), |total| printer.download_bar(total))
            .await?;
        self.pause().await;
        Ok(())
    }

    async fn extract(&self) -> Result<()> {
        let install_dir = self.config.install_dir.clone();
        let archive = self.config.archive_path();
        let extract_path = self.config.extract_path();

        if fs_utils::remove_dir_if_exists(&extract_path)? {
            warn!("Removed leftover folder {} from an earlier run", extract_path.display());
        }

        self.printer.step("Extracting zip file...");
        let archive_for_task = archive.clone();
        let entries =
            tokio::task::spawn_blocking(move || extract_archive(&archive_for_task, &install_dir))
                .await
                .context("Extraction task panicked")??;
        debug!("Extracted {entries} entries from {}", archive.display());
        self.pause().await;

        self.printer.step("Deleting zip file...");
        tokio::fs::remove_file(&archive)
            .await
            .with_context(|| format!("Failed to delete {}", archive.display()))?;
        self.pause().await;

        if !extract_path.is_dir() {
            return Err(UpdaterError::ArchiveLayout {
                folder: self.config.extract_folder.clone(),
            }
            .into());
        }
        Ok(())
    }

    async fn migrate(&self) -> Result<()> {
        let root = &self.config.install_dir;
        let new_tree = self.config.extract_path();

        if let Some(updater) = self.config.updater_file_name() {
            self.printer.step("Copying this script to the new folder...");
            fs_utils::copy_if_exists(&root.join(updater), &new_tree.join(updater))?;
            self.pause().await;
        }

        self.printer.step("Copying id and cookies files (if present)...");
        let names = self.config.preserved_files.iter().map(String::as_str).chain([CONFIG_FILE]);
        for name in names {
            if fs_utils::copy_if_exists(&root.join(name), &new_tree.join(name))? {
                debug!("Preserved {name}");
            }
        }
        self.pause().await;
        Ok(())
    }

    async fn purge(&self) -> Result<()> {
        let root = &self.config.install_dir;

        self.printer.step(&format!("Deleting {} folder...", self.config.cache_folder));
        if !fs_utils::remove_dir_if_exists(&root.join(&self.config.cache_folder))? {
            debug!("No {} folder to delete", self.config.cache_folder);
        }
        self.pause().await;

        self.printer.step("Deleting old files in this folder...");
        let updater = self.config.updater_file_name();
        for file in fs_utils::list_files(root)? {
            if updater.is_some() && file.file_name() == updater {
                continue;
            }
            remove_file(&file)?;
        }

        if self.config.replace_directories {
            self.remove_replaced_directories()?;
        }
        self.pause().await;
        Ok(())
    }

    fn remove_replaced_directories(&self) -> Result<()> {
        let root = &self.config.install_dir;
        for dir in fs_utils::list_dirs(&self.config.extract_path())? {
            let Some(name) = dir.file_name() else {
                continue;
            };
            if name == self.config.extract_folder.as_str() {
                continue;
            }
            if fs_utils::remove_dir_if_exists(&root.join(name))? {
                debug!("Removed old directory {}", name.to_string_lossy());
            }
        }
        Ok(())
    }

    async fn move_new_files(&self) -> Result<()> {
        self.printer.step("Moving new files to this folder...");
        let root = &self.config.install_dir;
        for entry in fs_utils::list_entries(&self.config.extract_path())? {
            if fs_utils::move_into(&entry, root)? == MoveOutcome::AlreadyExists {
                debug!("Skipped {}, already present", entry.display());
            }
        }
        self.pause().await;
        Ok(())
    }

    async fn finalize(&self, remote_timestamp: &str) -> Result<()> {
        self.printer.step("Deleting empty 'new' folder...");
        fs_utils::remove_dir_if_exists(&self.config.extract_path())?;
        self.pause().await;

        self.printer.step("Creating file with the updated commit date...");
        LocalStateStore::new(self.config.state_path()).write(remote_timestamp).await?;
        self.pause().await;
        Ok(())
    }
}

fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete old file {}", path.display())),
    }
}

/// Unpack `archive` into `dest`, returning the number of entries written.
///
/// Entries whose names would escape `dest` (absolute paths, `..`) are
/// rejected before anything is written for them.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let file = fs::File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read archive {}", archive.display()))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(anyhow::anyhow!("Archive entry has an unsafe path: '{}'", entry.name()));
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs_utils::ensure_dir(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs_utils::ensure_dir(parent)?;
        }
        let mut out = fs::File::create(&out_path)
            .with_context(|| format!("Failed to create {}", out_path.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {}", out_path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions on {}", out_path.display()))?;
        }
    }

    Ok(zip.len())
}
