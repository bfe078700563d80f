//! # Tarman CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module provides shared utility functions and re-exports common crates
//! used across multiple integration test files. This avoids code duplication
//! in the test suite.
//!
//! Integration tests are located in the `cli/tests/` directory and each `.rs` file
//! in that directory (that isn't a module like this one) is compiled as a separate
//! test crate linked against the main `tarman` binary crate.
//!

// Allow potentially unused code in this common module, as different test files might use different helpers.
#![allow(dead_code)]

// Re-export common crates/modules needed by multiple test files
pub use assert_cmd::Command;

use std::path::Path;

/// # Get Tarman Command (`tarman_cmd`)
///
/// Helper function to create an `assert_cmd::Command` instance pointing to the
/// compiled `tarman` binary target for the current test run.
///
/// This ensures tests execute the correct binary being built.
///
/// ## Panics
/// Panics if the `tarman` binary cannot be found via `Command::cargo_bin`.
///
/// ## Returns
/// * `Command` - An `assert_cmd::Command` ready to have arguments added and assertions run.
pub fn tarman_cmd() -> Command {
    Command::cargo_bin("tarman").expect("Failed to find tarman binary for testing")
}

/// Writes a real single-entry tar archive at `path` using the `tar` crate,
/// so detection and listing tests have genuine fixtures to chew on.
pub fn write_tar_fixture(path: &Path, entry_name: &str, content: &[u8]) {
    let file = std::fs::File::create(path).expect("create tar fixture");
    let mut builder = tar::Builder::new(file);
    let mut header = tar::Header::new_ustar();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, entry_name, content)
        .expect("append fixture entry");
    builder.finish().expect("finish tar fixture");
}

/// Writes a real gzip stream at `path` using the `flate2` crate.
pub fn write_gzip_fixture(path: &Path, content: &[u8]) {
    use std::io::Write;
    let file = std::fs::File::create(path).expect("create gzip fixture");
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(content).expect("write gzip fixture");
    encoder.finish().expect("finish gzip fixture");
}
