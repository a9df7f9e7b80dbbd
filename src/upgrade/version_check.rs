use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::constants::{API_TIMEOUT, CONNECT_TIMEOUT, USER_AGENT};
use crate::core::UpdaterError;

/// Latest-version marker read from the commit-list API.
///
/// Only `created_at` is kept, verbatim, because it is written back to the
/// local version record without reformatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommitInfo {
    /// Commit creation timestamp as returned by the API.
    pub created_at: String,
}

/// Queries the upstream commit list for the latest change timestamp.
///
/// Every failure mode (connection error, non-200 status, unusable payload)
/// ends the update attempt for this run. Nothing is retried.
///
/// # Examples
///
/// ```rust,no_run
/// use ps_updater::upgrade::VersionChecker;
///
/// # async fn example() -> anyhow::Result<()> {
/// let checker = VersionChecker::new("https://gitlab.com/api/v4/projects/18406702/repository/commits")?;
/// let latest = checker.latest_commit().await?;
/// println!("Latest commit: {}", latest.created_at);
/// # Ok(())
/// # }
/// ```
pub struct VersionChecker {
    client: reqwest::Client,
    url: String,
}

impl VersionChecker {
    /// Create a checker for the given commit-list endpoint.
    ///
    /// # Errors
    ///
    /// Fails for URLs that are not `http`/`https` or when the HTTP client
    /// cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        ensure_http_url(&url)?;
        Ok(Self {
            client: api_client()?,
            url,
        })
    }

    /// Endpoint this checker queries.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the commit list and return its first element.
    ///
    /// # Errors
    ///
    /// - [`UpdaterError::ApiUnavailable`] on connection failure or non-200 status
    /// - [`UpdaterError::NoCommits`] when the payload is empty or not a JSON array
    /// - [`UpdaterError::MissingCommitDate`] when the first commit has no `created_at`
    pub async fn latest_commit(&self) -> Result<RemoteCommitInfo> {
        debug!("Checking for updates at {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpdaterError::ApiUnavailable {
                url: self.url.clone(),
                status: None,
                source: Some(e),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("Commit list request returned HTTP {status}");
            return Err(UpdaterError::ApiUnavailable {
                url: self.url.clone(),
                status: Some(status.as_u16()),
                source: None,
            }
            .into());
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", self.url))?;

        let latest = parse_commit_list(&self.url, &body)?;
        debug!("Latest commit date: {}", latest.created_at);
        Ok(latest)
    }
}

/// Extract the first commit from a commit-list payload.
///
/// A body that is not a JSON array is treated as an empty list.
pub fn parse_commit_list(url: &str, body: &str) -> Result<RemoteCommitInfo> {
    let commits: Vec<serde_json::Value> = serde_json::from_str(body).unwrap_or_else(|e| {
        warn!("Commit list is not a JSON array ({e}), treating it as empty");
        Vec::new()
    });

    let first = commits.into_iter().next().ok_or_else(|| UpdaterError::NoCommits {
        url: url.to_string(),
    })?;

    serde_json::from_value(first).map_err(|e| {
        debug!("Unusable latest commit: {e}");
        UpdaterError::MissingCommitDate.into()
    })
}

/// Reject URLs whose scheme is not `http` or `https`.
pub fn ensure_http_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url).map_err(|e| UpdaterError::ConfigError {
        message: format!("invalid url '{url}': {e}"),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(UpdaterError::InsecureUrl {
            url: url.to_string(),
        }
        .into()),
    }
}

/// Client for small API requests, bounded in total time.
fn api_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(API_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Client for large downloads: only connecting and stalled reads time out.
pub(crate) fn download_client(stall_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(stall_timeout)
        .build()
        .context("Failed to build HTTP client")
}
