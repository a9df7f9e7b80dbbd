use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Persists the timestamp of the last applied upstream commit.
///
/// The record is a plain-text file holding exactly the timestamp string
/// returned by the commit API. A missing file means no version has been
/// recorded yet. There is no locking: a single updater process is assumed.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the recorded timestamp, trimmed of surrounding whitespace.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub async fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let timestamp = content.trim().to_string();
                debug!("Local version record: {timestamp}");
                Ok(Some(timestamp))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No local version record at {}", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read version record {}", self.path.display())),
        }
    }

    /// Create or overwrite the record with exactly `timestamp`.
    pub async fn write(&self, timestamp: &str) -> Result<()> {
        fs::write(&self.path, timestamp)
            .await
            .with_context(|| format!("Failed to write version record {}", self.path.display()))?;
        debug!("Recorded version {timestamp} in {}", self.path.display());
        Ok(())
    }
}
