//! # Tarman Command Modules (`commands`)
//!
//! File: cli/src/commands/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module aggregates the implementation of every `tarman` subcommand.
//! Each subcommand lives in its own file as a clap `Parser` struct plus an
//! async `handle_*` function, and `main.rs` routes execution here. The
//! shared glue — classifying the archive a command was pointed at, and
//! converting a failed pipeline run into the error the user sees — lives in
//! this file.
//!
//! ## Architecture
//!
//! Every handler follows the same shape:
//! 1. Classify the archive (magic numbers, falling back to the file name
//!    for archives that do not exist yet).
//! 2. Translate command-line flags onto the `ArchiveDescriptor`, rejecting
//!    flags the archive kind's capabilities deny.
//! 3. Create a scratch directory when the operation needs staging.
//! 4. Compile the operation into a `CommandPipeline` and run it.
//! 5. Report success, or surface which stage failed.
//!
//! ## Usage
//!
//! ```bash
//! tarman list backup.tar.gz
//! tarman add backup.tar.gz notes.txt
//! tarman delete backup.tar.gz notes.txt
//! tarman extract backup.tar.gz -d ./unpacked
//! tarman test backup.tar.gz
//! ```
//!
use crate::common::archive::{detect, ArchiveDescriptor};
use crate::common::process::PipelineOutcome;
use crate::core::error::{Result, TarmanError};
use std::path::Path;
use tracing::debug;

/// Implements `tarman add` (append/update/create, whole-file compress).
pub mod add;
/// Implements `tarman delete` (remove entries from tar-family archives).
pub mod delete;
/// Implements `tarman extract` (structured or flattened extraction).
pub mod extract;
/// Implements `tarman list` (verbose listing into parsed entries).
pub mod list;

/// Classifies an existing archive and builds the session descriptor for it.
pub(crate) fn open_archive(path: &Path) -> Result<ArchiveDescriptor> {
    let kind = detect::detect_kind(path)?;
    debug!("Classified {} as {}", path.display(), kind);
    Ok(ArchiveDescriptor::new(kind, path))
}

/// Converts a failed pipeline run into the error shown to the user, carrying
/// the failed stage, the rendered command, and the captured tool output.
pub(crate) fn pipeline_failure(outcome: PipelineOutcome) -> anyhow::Error {
    match outcome.failure {
        Some(failure) => TarmanError::ExternalCommand {
            cmd: failure.command,
            stage: failure.stage.to_string(),
            status: failure.status,
            output: outcome.output,
        }
        .into(),
        None => TarmanError::Archive("pipeline failed without a reported step".into()).into(),
    }
}
