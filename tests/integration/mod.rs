//! Integration test suite for ps-updater
//!
//! End-to-end tests of complete update runs against a local HTTP server that
//! plays the upstream forge. No test reaches the real network.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: Mock upstream server and configuration helpers
//! - **update_flow**: Library-level update runs and their effect on disk
//! - **cli**: The `ps-updater` binary: output, report, and exit status

mod cli;
mod common;
mod update_flow;
