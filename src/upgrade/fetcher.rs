use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::UpdaterError;
use crate::upgrade::version_check::{download_client, ensure_http_url};
use crate::utils::progress::ProgressBar;

/// Downloads the upstream archive to a fixed location.
///
/// The response body is streamed to disk chunk by chunk while a progress bar
/// advances. An existing file at the destination is overwritten. A slow
/// download is never cut off as long as data keeps arriving within the stall
/// timeout.
pub struct Fetcher {
    client: reqwest::Client,
    url: String,
}

impl Fetcher {
    /// Fetcher for the archive at `url`, giving up when no data arrives for
    /// `stall_timeout`.
    pub fn new(url: impl Into<String>, stall_timeout: Duration) -> Result<Self> {
        let url = url.into();
        ensure_http_url(&url)?;
        Ok(Self {
            client: download_client(stall_timeout)?,
            url,
        })
    }

    /// Archive URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the archive to `dest`, returning the number of bytes written.
    ///
    /// `make_bar` receives the advertised content length, if any.
    ///
    /// # Errors
    ///
    /// - transport failures as [`reqwest::Error`]
    /// - [`UpdaterError::DownloadFailed`] on a non-success status
    /// - [`std::io::Error`] when the destination cannot be written
    pub async fn download_to(
        &self,
        dest: &Path,
        make_bar: impl FnOnce(Option<u64>) -> ProgressBar,
    ) -> Result<u64> {
        debug!("Downloading {} to {}", self.url, dest.display());

        let mut response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to download archive from {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdaterError::DownloadFailed {
                url: self.url.clone(),
                status: status.as_u16(),
            }
            .into());
        }

        let progress = make_bar(response.content_length());
        progress.set_prefix("Downloading");

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to read archive from {}", self.url))?
        {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            written += chunk.len() as u64;
            progress.inc(chunk.len() as u64);
        }

        file.flush().await.with_context(|| format!("Failed to write {}", dest.display()))?;
        progress.finish_and_clear();

        debug!("Downloaded {written} bytes");
        Ok(written)
    }

    /// Download to `dest` without a visible progress bar.
    pub async fn download_quietly(&self, dest: &Path) -> Result<PathBuf> {
        self.download_to(dest, |_| ProgressBar::hidden()).await?;
        Ok(dest.to_path_buf())
    }
}
