//! Error types for ps-updater.
//!
//! Domain failures are expressed as [`UpdaterError`] variants and travel
//! through the update flow wrapped in [`anyhow::Error`] with added context,
//! the same way the rest of the crate propagates errors with `?`.
//!
//! The variants intentionally stay coarse. The version check reports every
//! transport, status, and payload problem through a handful of kinds because
//! the only consumer is the diagnostic report shown to a human.

use thiserror::Error;

/// Enumerated failures of the update flow.
///
/// Filesystem failures are not listed here: they surface as
/// [`std::io::Error`] (or [`zip::result::ZipError`] during extraction) with
/// the offending path attached as context.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// The commit-list API could not be reached or answered with a non-200 status.
    ///
    /// `status` is `None` when no HTTP response was received at all; the
    /// transport error is kept as `source` in that case.
    #[error("Couldn't retrieve updates information at this url: '{url}'")]
    ApiUnavailable {
        /// Endpoint that was queried
        url: String,
        /// HTTP status code, if a response arrived
        status: Option<u16>,
        /// Transport failure, if no response arrived
        #[source]
        source: Option<reqwest::Error>,
    },

    /// A URL with a scheme other than `http`/`https` was configured.
    #[error("Incorrect and possibly insecure protocol in url: '{url}'")]
    InsecureUrl {
        /// The rejected URL
        url: String,
    },

    /// The commit list was empty or could not be decoded as a JSON array.
    #[error("No commits returned by '{url}'")]
    NoCommits {
        /// Endpoint that was queried
        url: String,
    },

    /// The latest commit has no `created_at` field.
    #[error("Latest commit has no 'created_at' field")]
    MissingCommitDate,

    /// A timestamp could not be parsed as ISO-8601.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The text that failed to parse
        value: String,
        /// Parser message
        reason: String,
    },

    /// The archive download answered with a non-success status.
    #[error("Failed to download archive from '{url}' (HTTP {status})")]
    DownloadFailed {
        /// Archive URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The extracted archive does not contain the expected top-level folder.
    #[error("Extracted archive does not contain the folder '{folder}'")]
    ArchiveLayout {
        /// Folder name that was expected after extraction
        folder: String,
    },

    /// Invalid runtime configuration.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },
}

impl UpdaterError {
    /// Name of the variant, used as the type name in diagnostic reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ApiUnavailable { .. } => "ApiUnavailable",
            Self::InsecureUrl { .. } => "InsecureUrl",
            Self::NoCommits { .. } => "NoCommits",
            Self::MissingCommitDate => "MissingCommitDate",
            Self::InvalidTimestamp { .. } => "InvalidTimestamp",
            Self::DownloadFailed { .. } => "DownloadFailed",
            Self::ArchiveLayout { .. } => "ArchiveLayout",
            Self::ConfigError { .. } => "ConfigError",
        }
    }
}

/// Best-effort type name for an error and its chain.
///
/// An [`UpdaterError`] anywhere in the chain wins and is reported as
/// `UpdaterError::<Variant>`. Otherwise the deepest error whose concrete type
/// is known to the crate names the failure. Errors created from plain strings
/// fall back to `Error`.
#[must_use]
pub fn error_type_name(error: &anyhow::Error) -> String {
    for cause in error.chain() {
        if let Some(updater_error) = cause.downcast_ref::<UpdaterError>() {
            return format!("UpdaterError::{}", updater_error.kind());
        }
    }

    let mut name = None;
    for cause in error.chain() {
        if let Some(known) = known_type_name(cause) {
            name = Some(known);
        }
    }
    name.unwrap_or("Error").to_string()
}

fn known_type_name(cause: &(dyn std::error::Error + 'static)) -> Option<&'static str> {
    if cause.is::<std::io::Error>() {
        Some("std::io::Error")
    } else if cause.is::<reqwest::Error>() {
        Some("reqwest::Error")
    } else if cause.is::<zip::result::ZipError>() {
        Some("zip::result::ZipError")
    } else if cause.is::<serde_json::Error>() {
        Some("serde_json::Error")
    } else if cause.is::<toml::de::Error>() {
        Some("toml::de::Error")
    } else if cause.is::<chrono::ParseError>() {
        Some("chrono::ParseError")
    } else {
        None
    }
}
