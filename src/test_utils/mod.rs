//! Test utilities for ps-updater
//!
//! Helpers shared by unit tests and the integration test target: logging
//! setup, temporary installation directories, and in-memory upstream archives.
//!
//! # Example
//!
//! ```rust,no_run
//! use ps_updater::test_utils::{ArchiveBuilder, InstallDirFixture};
//!
//! let fixture = InstallDirFixture::installed();
//! fixture.record_version("2021-08-17T23:59:00+00:00");
//! let archive = ArchiveBuilder::upstream().file("extra.py", "x = 1").build();
//! assert!(!archive.is_empty());
//! ```

pub mod fixtures;

pub use fixtures::{ArchiveBuilder, InstallDirFixture};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Route `tracing` output of the updater to the test harness.
///
/// Logging stays off unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=ps_updater=debug cargo test`. Only the first call has an effect.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let Ok(filter) = EnvFilter::try_from_default_env() else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init();
    });
}
