//! Complete update runs through the library API.

use anyhow::Result;
use ps_updater::core::UpdaterError;
use ps_updater::test_utils::{ArchiveBuilder, InstallDirFixture, init_test_logging};
use ps_updater::upgrade::{InstallStage, SelfUpdater, UpdateStatus};

use crate::common::Upstream;

const LOCAL: &str = "2021-08-17T23:59:00+00:00";
const REMOTE: &str = "2021-08-18T00:00:00+00:00";

/// The reference scenario: one minute newer upstream means an update, and the
/// record ends up holding the API's timestamp verbatim.
#[tokio::test]
async fn test_newer_commit_updates_and_records_exact_timestamp() -> Result<()> {
    init_test_logging();
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(matches!(status, UpdateStatus::Updated), "unexpected status: {status:?}");
    assert_eq!(fixture.recorded_version().as_deref(), Some(REMOTE));
    assert_eq!(fixture.read("panoptoSync.py"), "print('new version')");
    assert_eq!(fixture.read("LICENSE"), "GPL-3.0");
    assert_eq!(upstream.downloads().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_timestamp_with_milliseconds_and_offset_is_kept_verbatim() -> Result<()> {
    let remote = "2021-08-18T02:00:00.000+02:00";
    let upstream = Upstream::with_commit(remote, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(matches!(status, UpdateStatus::Updated));
    assert_eq!(fixture.recorded_version().as_deref(), Some(remote));
    Ok(())
}

#[tokio::test]
async fn test_preserved_files_survive_update() -> Result<()> {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    fixture.write("default.id", "user-id-123");
    fixture.write("default.cookies", "session=abc");

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(status.is_success());
    assert_eq!(fixture.read("default.id"), "user-id-123");
    assert_eq!(fixture.read("default.cookies"), "session=abc");
    Ok(())
}

#[tokio::test]
async fn test_absent_preserved_files_stay_absent() -> Result<()> {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    fixture.write("default.id", "user-id-123");

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(status.is_success());
    assert!(fixture.exists("default.id"));
    assert!(!fixture.exists("default.cookies"));
    Ok(())
}

#[tokio::test]
async fn test_preserved_file_in_archive_does_not_override_local_copy() -> Result<()> {
    let archive = ArchiveBuilder::upstream().file("default.id", "shipped-id");
    let upstream = Upstream::with_commit(REMOTE, &archive).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    fixture.write("default.id", "user-id-123");

    SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert_eq!(fixture.read("default.id"), "user-id-123");
    Ok(())
}

#[tokio::test]
async fn test_config_file_is_carried_forward() -> Result<()> {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    upstream.write_config_file(&fixture);
    let before = fixture.read("ps_updater.toml");

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(status.is_success());
    assert_eq!(fixture.read("ps_updater.toml"), before);
    Ok(())
}

#[tokio::test]
async fn test_user_directories_are_kept_by_default() -> Result<()> {
    let archive = ArchiveBuilder::upstream().file("panopto/api.py", "new api");
    let upstream = Upstream::with_commit(REMOTE, &archive).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    fixture.write("downloads/lecture-01.mp4", "video");
    fixture.write("panopto/api.py", "old api");

    SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert_eq!(fixture.read("downloads/lecture-01.mp4"), "video");
    // Existing directories shadow the new ones when not replaced
    assert_eq!(fixture.read("panopto/api.py"), "old api");
    Ok(())
}

#[tokio::test]
async fn test_replace_directories_swaps_shadowed_directories() -> Result<()> {
    let archive = ArchiveBuilder::upstream().file("panopto/api.py", "new api");
    let upstream = Upstream::with_commit(REMOTE, &archive).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);
    fixture.write("downloads/lecture-01.mp4", "video");
    fixture.write("panopto/api.py", "old api");
    fixture.write("panopto/removed_upstream.py", "stale");

    let mut config = upstream.config(&fixture);
    config.replace_directories = true;
    SelfUpdater::new(config).run().await;

    assert_eq!(fixture.read("downloads/lecture-01.mp4"), "video");
    assert_eq!(fixture.read("panopto/api.py"), "new api");
    assert!(!fixture.exists("panopto/removed_upstream.py"));
    Ok(())
}

#[tokio::test]
async fn test_small_difference_is_not_an_update() -> Result<()> {
    let upstream =
        Upstream::with_commit("2021-08-17T23:59:29+00:00", &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(matches!(status, UpdateStatus::UpToDate));
    assert_eq!(upstream.downloads().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_first_run_records_without_download() -> Result<()> {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::installed();

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(matches!(status, UpdateStatus::VersionRecorded));
    assert_eq!(fixture.recorded_version().as_deref(), Some(REMOTE));
    assert_eq!(upstream.downloads().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_fresh_install_into_empty_directory() -> Result<()> {
    let upstream = Upstream::with_commit(REMOTE, &ArchiveBuilder::upstream()).await;
    let fixture = InstallDirFixture::empty();

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert!(matches!(status, UpdateStatus::Installed));
    assert!(fixture.exists("panoptoSync.py"));
    assert!(fixture.exists("panopto/__init__.py"));
    assert_eq!(fixture.recorded_version().as_deref(), Some(REMOTE));
    Ok(())
}

#[tokio::test]
async fn test_empty_commit_list_fails() -> Result<()> {
    let upstream = Upstream::with_body("[]").await;
    let fixture = InstallDirFixture::installed();

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    let failure = status.failure().expect("run should fail");
    assert!(matches!(
        failure.error.downcast_ref::<UpdaterError>(),
        Some(UpdaterError::NoCommits { .. })
    ));
    assert!(fixture.recorded_version().is_none());
    Ok(())
}

#[tokio::test]
async fn test_malformed_commit_list_fails_like_empty() -> Result<()> {
    let upstream = Upstream::with_body("<html>maintenance</html>").await;
    let fixture = InstallDirFixture::installed();

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert_eq!(status.failure().unwrap().report().type_name, "UpdaterError::NoCommits");
    Ok(())
}

#[tokio::test]
async fn test_commit_without_date_fails() -> Result<()> {
    let upstream = Upstream::with_body(r#"[{"id": "9f1c2e"}]"#).await;
    let fixture = InstallDirFixture::installed();

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    assert_eq!(status.failure().unwrap().report().type_name, "UpdaterError::MissingCommitDate");
    Ok(())
}

#[tokio::test]
async fn test_archive_with_wrong_layout_fails_at_extraction() -> Result<()> {
    let archive = ArchiveBuilder::new("panopto-sync-main").file("panoptoSync.py", "print()");
    let upstream = Upstream::with_commit(REMOTE, &archive).await;
    let fixture = InstallDirFixture::installed();
    fixture.record_version(LOCAL);

    let status = SelfUpdater::new(upstream.config(&fixture)).run().await;

    let failure = status.failure().expect("run should fail");
    assert_eq!(failure.stage, Some(InstallStage::Extracted));
    assert_eq!(failure.report().type_name, "UpdaterError::ArchiveLayout");
    // Old files are only removed after the new tree has been found
    assert_eq!(fixture.read("panoptoSync.py"), "print('old version')");
    assert_eq!(fixture.recorded_version().as_deref(), Some(LOCAL));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_api_reports_generic_error() -> Result<()> {
    let upstream = Upstream::failing(500).await;
    let fixture = InstallDirFixture::installed();
    let config = upstream.config(&fixture);
    let url = config.commits_url.clone();

    let status = SelfUpdater::new(config).run().await;

    let report = status.failure().expect("run should fail").report();
    assert_eq!(
        report.message,
        format!("Couldn't retrieve updates information at this url: '{url}'")
    );
    Ok(())
}
