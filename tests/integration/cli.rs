//! Tests of the `ps-updater` binary.
//!
//! The binary always exits with status 0, so these tests assert on stdout and
//! on the installation directory instead of the exit code alone.

use assert_cmd::Command;
use predicates::prelude::*;
use ps_updater::constants::{ISSUES_URL, NO_PROGRESS_ENV};
use ps_updater::test_utils::{ArchiveBuilder, InstallDirFixture};

use crate::common::Upstream;

const LOCAL: &str = "2021-08-17T23:59:00+00:00";
const REMOTE: &str = "2021-08-18T00:00:00+00:00";

fn updater(fixture: &InstallDirFixture) -> Command {
    let mut cmd = Command::cargo_bin("ps-updater").unwrap();
    cmd.arg("--dir")
        .arg(fixture.path())
        .env(NO_PROGRESS_ENV, "1")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_update_prints_steps_and_banner() {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("PanoptoSync was coded by Microeinstein"))
        .stdout(predicate::str::contains("Checking if an update is available..."))
        .stdout(predicate::str::contains(
            "A new PanoptoSync update is available... downloading it...",
        ))
        .stdout(predicate::str::contains("Downloading zip file..."))
        .stdout(predicate::str::contains("Moving new files to this folder..."))
        .stdout(predicate::str::contains("Done."))
        .stdout(predicate::str::ends_with("==============================\n\n"));

    assert_eq!(fixture.recorded_version().as_deref(), Some(REMOTE));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verbose_prints_each_step_once() {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Downloading zip file..."))
        .stderr(predicate::str::contains("Downloading zip file...").not())
        .stderr(predicate::str::contains("Deleting old files in this folder...").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_up_to_date_message() {
    let upstream = Upstream::with_commit(LOCAL, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("There are no PanoptoSync updates available"))
        .stdout(predicate::str::contains("Downloading").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_first_run_message() {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    upstream.write_config_file(&fixture);

    updater(&fixture).assert().success().stdout(predicate::str::contains(
        "Created version file. There seem to be no PanoptoSync updates available",
    ));

    assert_eq!(fixture.recorded_version().as_deref(), Some(REMOTE));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_only_reports() {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .arg("--check")
        .assert()
        .success()
        .stdout(predicate::str::contains("A new PanoptoSync update is available"));

    assert_eq!(fixture.recorded_version().as_deref(), Some(LOCAL));
    assert_eq!(upstream.downloads().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_failure_prints_report_and_exits_zero() {
    let upstream = Upstream::failing(500).await;
    let fixture = InstallDirFixture::installed();
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("An unexpected error occurred:"))
        .stdout(predicate::str::contains(
            "UpdaterError::ApiUnavailable: Couldn't retrieve updates information at this url:",
        ))
        .stdout(predicate::str::contains(ISSUES_URL))
        .stdout(predicate::str::contains("PanoptoSync should still work!"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_includes_backtrace_without_env_setting() {
    let upstream = Upstream::with_body("[]").await;
    let fixture = InstallDirFixture::installed();
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .env_remove("RUST_BACKTRACE")
        .env_remove("RUST_LIB_BACKTRACE")
        .assert()
        .success()
        .stdout(predicate::str::contains("Traceback:"))
        .stdout(predicate::str::contains("backtrace not captured").not())
        .stdout(predicate::str::contains("UpdaterError::NoCommits"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_quiet_prints_only_report() {
    let upstream = Upstream::failing(503).await;
    let fixture = InstallDirFixture::installed();
    upstream.write_config_file(&fixture);

    updater(&fixture)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("PanoptoSync was coded by").not())
        .stdout(predicate::str::contains("UpdaterError::ApiUnavailable"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let fixture = InstallDirFixture::installed();
    fixture.write("ps_updater.toml", "threshold_secs = \"soon\"");

    updater(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to parse configuration"))
        .stdout(predicate::str::contains("toml::de::Error"));
}

#[test]
fn test_insecure_url_in_config_is_reported() {
    let fixture = InstallDirFixture::installed();
    fixture.write("ps_updater.toml", "commits_url = \"file:///etc/passwd\"");

    updater(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("UpdaterError::InsecureUrl"));
}

#[test]
fn test_help_lists_flags() {
    Command::cargo_bin("ps-updater")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--check"))
        .stdout(predicate::str::contains("--step-delay"));
}
