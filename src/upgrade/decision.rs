use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use std::fmt;
use tracing::debug;

use crate::constants::UPDATE_THRESHOLD_SECS;
use crate::core::UpdaterError;

/// What an update run should do, given the local and remote versions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateDecision {
    /// The application is missing; download and install it.
    Install,
    /// First run of the updater on an existing installation: record the
    /// remote timestamp without downloading.
    RecordOnly,
    /// The remote is newer than the local record by `elapsed_secs`.
    Update {
        /// Remote minus local, in seconds
        elapsed_secs: f64,
    },
    /// No newer version; `elapsed_secs` may be negative when local is ahead.
    UpToDate {
        /// Remote minus local, in seconds
        elapsed_secs: f64,
    },
}

impl UpdateDecision {
    /// Whether this decision downloads and installs the archive.
    pub const fn requires_download(&self) -> bool {
        matches!(self, Self::Install | Self::Update { .. })
    }
}

impl fmt::Display for UpdateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "not installed"),
            Self::RecordOnly => write!(f, "no version recorded yet"),
            Self::Update { elapsed_secs } => {
                write!(f, "update available ({elapsed_secs:.0}s newer)")
            }
            Self::UpToDate { .. } => write!(f, "up to date"),
        }
    }
}

/// Rules for turning a version comparison into an [`UpdateDecision`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdatePolicy {
    /// Remote must be newer than local by strictly more than this many seconds.
    pub threshold_secs: f64,
    /// Treat an up-to-date installation as outdated.
    pub force: bool,
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self {
            threshold_secs: UPDATE_THRESHOLD_SECS,
            force: false,
        }
    }
}

impl UpdatePolicy {
    /// Decide what to do.
    ///
    /// The installation check comes first: a missing application is always
    /// installed, whether or not a version was recorded. On an existing
    /// installation without a record, the remote timestamp is only recorded.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::InvalidTimestamp`] when either timestamp
    /// needs to be compared and cannot be parsed.
    pub fn decide(
        &self,
        local: Option<&str>,
        remote: &str,
        installed: bool,
    ) -> Result<UpdateDecision> {
        if !installed {
            return Ok(UpdateDecision::Install);
        }

        let Some(local) = local else {
            return Ok(UpdateDecision::RecordOnly);
        };

        let elapsed_secs = seconds_between(local, remote)?;
        debug!("Remote is {elapsed_secs}s ahead of local ({local} -> {remote})");

        if elapsed_secs > self.threshold_secs {
            Ok(UpdateDecision::Update { elapsed_secs })
        } else if self.force {
            debug!("Forcing update although versions match");
            Ok(UpdateDecision::Update { elapsed_secs })
        } else {
            Ok(UpdateDecision::UpToDate { elapsed_secs })
        }
    }
}

/// Seconds from `first` to `later`, negative when `later` is earlier.
///
/// Both values are ISO-8601 timestamps. Offsets are honoured; timestamps
/// without an offset are read as UTC. `T` or a space may separate date and
/// time, and fractional seconds are kept.
///
/// # Examples
///
/// ```rust
/// use ps_updater::upgrade::decision::seconds_between;
///
/// let secs = seconds_between("2021-08-17T23:59:00+00:00", "2021-08-18T02:00:00+02:00").unwrap();
/// assert_eq!(secs, 60.0);
/// ```
pub fn seconds_between(first: &str, later: &str) -> Result<f64> {
    let first = parse_timestamp(first)?;
    let later = parse_timestamp(later)?;
    let delta = later.signed_duration_since(first);
    Ok(delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1_000_000_000.0)
}

/// Parse an ISO-8601 timestamp into a fixed-offset date time.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    let mut last_error = None;
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        match NaiveDateTime::parse_from_str(trimmed, format) {
            Ok(naive) => return Ok(naive.and_utc().fixed_offset()),
            Err(e) => last_error = Some(e),
        }
    }

    Err(UpdaterError::InvalidTimestamp {
        value: value.to_string(),
        reason: last_error.map_or_else(|| "unrecognized format".to_string(), |e| e.to_string()),
    }
    .into())
}
