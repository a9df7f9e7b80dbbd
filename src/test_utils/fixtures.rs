//! Test fixtures for installation directories and upstream archives
//!
//! [`InstallDirFixture`] owns a temporary installation directory and
//! [`ArchiveBuilder`] produces zip archives shaped like the upstream download,
//! built in memory so tests never touch the network.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::constants::{ENTRY_FILE, STATE_FILE};
use crate::upgrade::config::UpdaterConfig;

/// Temporary installation directory, removed on drop.
pub struct InstallDirFixture {
    dir: TempDir,
}

impl InstallDirFixture {
    /// An empty directory: the application is not installed.
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// A directory with an old version of the application.
    pub fn installed() -> Self {
        let fixture = Self::empty();
        fixture.write(ENTRY_FILE, "print('old version')");
        fixture.write("README.md", "old readme");
        fixture
    }

    /// Root of the installation directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write fixture file");
        path
    }

    /// Read `relative` as text.
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.dir.path().join(relative))
            .unwrap_or_else(|e| panic!("Failed to read {relative}: {e}"))
    }

    /// Whether `relative` exists.
    pub fn exists(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }

    /// Write the local version record.
    pub fn record_version(&self, timestamp: &str) {
        self.write(STATE_FILE, timestamp);
    }

    /// Recorded version, if any.
    pub fn recorded_version(&self) -> Option<String> {
        fs::read_to_string(self.dir.path().join(STATE_FILE)).ok()
    }

    /// Quiet default configuration rooted at this directory.
    pub fn config(&self) -> UpdaterConfig {
        let mut config = UpdaterConfig::new(self.dir.path());
        config.quiet = true;
        config
    }
}

/// Builds zip archives in memory.
///
/// Files are placed under a single top-level folder, like the archives the
/// upstream forge serves for a branch.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    root: String,
    files: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    /// Archive whose entries live under `root/`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
        }
    }

    /// The upstream layout with a minimal application.
    pub fn upstream() -> Self {
        Self::new(crate::constants::EXTRACT_FOLDER)
            .file(ENTRY_FILE, "print('new version')")
            .file("README.md", "new readme")
            .file("LICENSE", "GPL-3.0")
            .file("panopto/__init__.py", "")
    }

    /// Add a file at `relative` below the root folder.
    #[must_use]
    pub fn file(mut self, relative: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.push((relative.to_string(), content.as_ref().to_vec()));
        self
    }

    /// Encode the archive.
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = options();

        zip.add_directory(format!("{}/", self.root), options).expect("Failed to add root folder");
        for (relative, content) in &self.files {
            zip.start_file(format!("{}/{relative}", self.root), options)
                .expect("Failed to start zip entry");
            zip.write_all(content).expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish archive").into_inner()
    }

    /// Archive with exactly the given entry names, no root folder added.
    pub fn raw(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            zip.start_file(*name, options()).expect("Failed to start zip entry");
            zip.write_all(content.as_bytes()).expect("Failed to write zip entry");
        }
        zip.finish().expect("Failed to finish archive").into_inner()
    }
}

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated)
}
