//! Core types shared across ps-updater.
//!
//! - [`error`]: the [`UpdaterError`] enum and type-name resolution for error chains
//! - [`error_report`]: the [`ErrorReport`] diagnostic block printed on failure

pub mod error;
pub mod error_report;

pub use error::{UpdaterError, error_type_name};
pub use error_report::{ErrorReport, capture_backtraces_by_default};
