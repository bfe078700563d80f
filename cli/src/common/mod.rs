//! # Tarman Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module serves as the root and organizational entry point for all shared,
//! common utility modules used throughout the Tarman CLI application. It aggregates
//! the archive core (kind taxonomy, listing parser, pipeline compiler), the
//! filesystem helpers, and the external-process pipeline runner.
//!
//! By centralizing these utilities under the `common::` namespace, Tarman aims to
//! promote code reuse, maintain consistency, and provide clear separation between
//! command-specific logic (`commands::`) and core infrastructure (`core::`).
//!
//! ## Architecture
//!
//! The `common` module itself primarily consists of declarations (`pub mod`) for its
//! various submodules. Each submodule encapsulates a specific domain of utility functions:
//!
//! - **`archive`**: The archive core — `ArchiveKind`/`ArchiveDescriptor`, magic-number detection, the verbose-listing parser, and the operation-to-pipeline compiler.
//! - **`fs`**: Foundational filesystem operations — ensuring directories exist, creating the scratch directories that staged operations run in.
//! - **`process`**: Sequential execution of compiled command pipelines via `tokio::process`, streaming listing output back to the parser.
//!
//! ## Usage
//!
//! Command handlers and other parts of the application import specific functionalities
//! directly from the required submodule within `common`.
//!
//! ```rust
//! // Example importing from different common submodules
//! use crate::common::{archive, fs, process};
//! use crate::core::error::Result;
//! use std::path::Path;
//!
//! # async fn run_example() -> Result<()> {
//! let path = Path::new("backup.tar.gz");
//!
//! // Classify the archive by content.
//! let kind = archive::detect::detect_kind(path)?;
//!
//! // Compile and run an integrity check.
//! let descriptor = archive::ArchiveDescriptor::new(kind, path);
//! let pipeline = archive::pipeline::compile_test(&descriptor);
//! let outcome = process::run_pipeline(&pipeline, None, |_line| {}).await?;
//! # Ok(())
//! # }
//! ```
//!
//! This modular approach keeps the utility codebase organized and maintainable.
//!

/// The archive core: kinds, detection, listing parser, pipeline compiler.
pub mod archive;
/// Utilities for filesystem operations (directory checks, scratch staging).
pub mod fs;
/// Utilities for executing compiled command pipelines as external processes.
pub mod process;
