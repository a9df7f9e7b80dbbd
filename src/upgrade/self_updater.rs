use anyhow::Result;
use std::fmt;
use tracing::{debug, info};

use crate::core::ErrorReport;
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::decision::{UpdateDecision, UpdatePolicy};
use crate::upgrade::fetcher::Fetcher;
use crate::upgrade::installer::{InstallStage, Installer};
use crate::upgrade::state::LocalStateStore;
use crate::upgrade::version_check::{RemoteCommitInfo, VersionChecker};
use crate::utils::progress::StepPrinter;

/// Outcome of one update run.
#[derive(Debug)]
pub enum UpdateStatus {
    /// The installed version is current; nothing changed.
    UpToDate,
    /// First run on an existing installation: the remote timestamp was
    /// recorded and nothing was downloaded.
    VersionRecorded,
    /// The application was missing and has been installed.
    Installed,
    /// A newer version has been installed.
    Updated,
    /// The run stopped on an error.
    Failed(UpdateFailure),
}

impl UpdateStatus {
    /// Whether the run ended without error.
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// The failure, if the run failed.
    pub const fn failure(&self) -> Option<&UpdateFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Error that ended an update run, with the install stage it prevented.
///
/// `stage` is `None` for failures before any install work started (version
/// check, reading the local record, parsing timestamps).
#[derive(Debug)]
pub struct UpdateFailure {
    /// Stage that could not be reached
    pub stage: Option<InstallStage>,
    /// Underlying error
    pub error: anyhow::Error,
}

impl UpdateFailure {
    /// Failure while reaching `stage`.
    pub fn at(stage: InstallStage, error: anyhow::Error) -> Self {
        Self {
            stage: Some(stage),
            error,
        }
    }

    /// Failure outside the install sequence.
    pub fn before_install(error: anyhow::Error) -> Self {
        Self { stage: None, error }
    }

    /// Diagnostic report for the underlying error.
    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error(&self.error)
    }
}

impl fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} failed: {}", stage.action(), self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl From<anyhow::Error> for UpdateFailure {
    fn from(error: anyhow::Error) -> Self {
        Self::before_install(error)
    }
}

/// Keeps the managed application in the installation directory current.
///
/// # Examples
///
/// ```rust,no_run
/// use ps_updater::upgrade::{SelfUpdater, UpdateStatus};
/// use ps_updater::upgrade::config::UpdaterConfig;
///
/// # async fn example() -> anyhow::Result<()> {
/// let updater = SelfUpdater::new(UpdaterConfig::new("/opt/panopto-sync"));
///
/// match updater.run().await {
///     UpdateStatus::Failed(failure) => failure.report().print(),
///     status => println!("{status:?}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct SelfUpdater {
    config: UpdaterConfig,
    printer: StepPrinter,
}

impl SelfUpdater {
    /// Updater for `config.install_dir`.
    pub fn new(config: UpdaterConfig) -> Self {
        let printer = StepPrinter::new(config.quiet);
        Self { config, printer }
    }

    /// Active configuration.
    pub const fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Decision rules derived from the configuration.
    pub fn policy(&self) -> UpdatePolicy {
        UpdatePolicy {
            threshold_secs: self.config.threshold_secs,
            force: self.config.force,
        }
    }

    fn state_store(&self) -> LocalStateStore {
        LocalStateStore::new(self.config.state_path())
    }

    /// Query the commit-list API for the latest version.
    pub async fn latest_commit(&self) -> Result<RemoteCommitInfo> {
        VersionChecker::new(&self.config.commits_url)?.latest_commit().await
    }

    /// Decide what a run would do without changing anything on disk.
    pub async fn check(&self) -> Result<UpdateDecision> {
        let remote = self.latest_commit().await?;
        self.decide(&remote).await
    }

    async fn decide(&self, remote: &RemoteCommitInfo) -> Result<UpdateDecision> {
        let installed = self.config.is_installed();
        let local = self.state_store().read().await?;
        let decision = self.policy().decide(local.as_deref(), &remote.created_at, installed)?;
        debug!("Update decision: {decision:?}");
        Ok(decision)
    }

    /// Perform a full update run.
    ///
    /// Never returns an error: every failure ends up in
    /// [`UpdateStatus::Failed`].
    pub async fn run(&self) -> UpdateStatus {
        match self.try_run().await {
            Ok(status) => {
                info!("Update run finished: {status:?}");
                status
            }
            Err(failure) => {
                info!("Update run failed: {failure}");
                UpdateStatus::Failed(failure)
            }
        }
    }

    async fn try_run(&self) -> Result<UpdateStatus, UpdateFailure> {
        let remote = self.latest_commit().await?;
        let decision = self.decide(&remote).await?;

        match decision {
            UpdateDecision::Install => {
                self.printer.step("Couldn't find PanoptoSync, downloading it now...");
                self.install(&remote).await?;
                Ok(UpdateStatus::Installed)
            }
            UpdateDecision::RecordOnly => {
                self.state_store().write(&remote.created_at).await?;
                self.printer.step(
                    "Created version file. There seem to be no PanoptoSync updates available",
                );
                Ok(UpdateStatus::VersionRecorded)
            }
            UpdateDecision::Update { elapsed_secs } => {
                debug!("The difference in seconds between these versions is {elapsed_secs}");
                self.printer.step("A new PanoptoSync update is available... downloading it...");
                self.install(&remote).await?;
                Ok(UpdateStatus::Updated)
            }
            UpdateDecision::UpToDate { .. } => {
                self.printer.step("There are no PanoptoSync updates available");
                Ok(UpdateStatus::UpToDate)
            }
        }
    }

    async fn install(&self, remote: &RemoteCommitInfo) -> Result<(), UpdateFailure> {
        let fetcher = Fetcher::new(&self.config.archive_url, self.config.download_stall_timeout())
            .map_err(|error| UpdateFailure::at(InstallStage::Downloaded, error))?;
        Installer::new(&self.config, self.printer).install(&fetcher, &remote.created_at).await
    }
}
