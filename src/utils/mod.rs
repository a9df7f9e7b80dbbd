//! Utility modules for ps-updater
//!
//! - [`fs`] - File system helpers used by the install stages
//! - [`progress`] - Progress bars and step messages

pub mod fs;
pub mod progress;

pub use fs::{MoveOutcome, move_into};
pub use progress::{ProgressBar, StepPrinter};
