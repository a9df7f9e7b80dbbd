//! Shared helpers for the integration tests.

use ps_updater::constants::CONFIG_FILE;
use ps_updater::test_utils::{ArchiveBuilder, InstallDirFixture};
use ps_updater::upgrade::config::UpdaterConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Local stand-in for the upstream commit API and archive download.
pub struct Upstream {
    pub server: MockServer,
}

impl Upstream {
    /// Server answering the commit list with a single commit created at
    /// `created_at` and serving `archive` for downloads.
    pub async fn with_commit(created_at: &str, archive: &ArchiveBuilder) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "9f1c2e", "title": "Latest", "created_at": created_at },
                { "id": "1a2b3c", "title": "Older", "created_at": "2020-01-01T00:00:00+00:00" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/archive.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.build()))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Server whose commit API answers every request with `status`.
    pub async fn failing(status: u16) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        Self { server }
    }

    /// Server whose commit API returns `body` verbatim.
    pub async fn with_body(body: &str) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/commits"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn commits_url(&self) -> String {
        format!("{}/commits", self.server.uri())
    }

    pub fn archive_url(&self) -> String {
        format!("{}/archive.zip", self.server.uri())
    }

    /// Number of archive downloads received so far.
    pub async fn downloads(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == "/archive.zip")
            .count()
    }

    /// Quiet configuration for `fixture` pointing at this server.
    pub fn config(&self, fixture: &InstallDirFixture) -> UpdaterConfig {
        let mut config = fixture.config();
        config.commits_url = self.commits_url();
        config.archive_url = self.archive_url();
        config
    }

    /// Write a `ps_updater.toml` into `fixture` pointing at this server.
    pub fn write_config_file(&self, fixture: &InstallDirFixture) {
        fixture.write(
            CONFIG_FILE,
            format!(
                "commits_url = \"{}\"\narchive_url = \"{}\"\n",
                self.commits_url(),
                self.archive_url()
            ),
        );
    }
}
