//! # Tarman Filesystem Utilities (`common::fs`)
//!
//! File: cli/src/common/fs/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module is the organizational entry point for shared filesystem
//! utilities: basic directory/file helpers (`io`) and the session-private
//! scratch directories (`scratch`) that stage compressed-tar mutation and
//! flattened extraction.
//!
//! ## Architecture
//!
//! - **`io`**: Foundational operations — ensuring directories exist before
//!   extraction or scratch work lands in them.
//! - **`scratch`**: Creation of exclusively-owned temporary staging
//!   directories via the `tempfile` crate; the directory is removed
//!   automatically when the owning guard is dropped.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::fs;
//!
//! fs::io::ensure_dir_exists(destination)?;
//! let scratch = fs::scratch::create_scratch_dir(config.scratch.directory.as_deref())?;
//! archive.scratch_dir = Some(scratch.path().to_path_buf());
//! ```
//!
/// Foundational filesystem operations (directory creation and checks).
pub mod io;
/// Scratch-directory creation for staged archive operations.
pub mod scratch;
