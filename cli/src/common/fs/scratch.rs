//! # Tarman Scratch Directories (`common::fs::scratch`)
//!
//! File: cli/src/common/fs/scratch.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! Staged archive operations — mutating a compressed tar, extracting without
//! directory structure — need a session-private directory to work in without
//! disturbing the real archive or the final destination until the operation
//! is known to succeed. This module creates those directories.
//!
//! ## Architecture
//!
//! Scratch directories are `tempfile::TempDir` guards: uniquely named,
//! prefixed `tarman-`, created under the configured base directory (or the
//! system temporary directory), and removed automatically when the guard is
//! dropped by the command handler — whether the pipeline succeeded or not.
//! A leftover staged copy inside a failed run's scratch directory is
//! therefore discarded with it, which is exactly the durability story the
//! staging procedure relies on.
//!
//! Failure to create the scratch directory is fatal to the whole operation:
//! the caller gets an error before any command is compiled or run.
//!
use crate::core::error::{Result, TarmanError};
use std::path::Path;
use tempfile::{Builder, TempDir};
use tracing::debug;

/// Creates a fresh, exclusively-owned scratch directory.
///
/// `base` overrides the parent directory (from the `scratch.directory`
/// config setting); the system temporary directory is used otherwise. The
/// returned guard removes the directory on drop.
pub fn create_scratch_dir(base: Option<&Path>) -> Result<TempDir> {
    let mut builder = Builder::new();
    builder.prefix("tarman-");
    let scratch = match base {
        Some(dir) => builder.tempdir_in(dir),
        None => builder.tempdir(),
    }
    .map_err(|e| TarmanError::Scratch(format!("failed to create scratch directory: {e}")))?;
    debug!("Created scratch directory: {:?}", scratch.path());
    Ok(scratch)
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scratch_dir_created_and_removed_on_drop() -> Result<()> {
        let scratch = create_scratch_dir(None)?;
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tarman-"));
        drop(scratch);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_scratch_dir_respects_base() -> Result<()> {
        let base = tempdir()?;
        let scratch = create_scratch_dir(Some(base.path()))?;
        assert_eq!(scratch.path().parent(), Some(base.path()));
        Ok(())
    }

    #[test]
    fn test_scratch_dir_missing_base_is_fatal() {
        let result = create_scratch_dir(Some(Path::new("/definitely/not/a/real/base")));
        assert!(result.is_err());
    }
}
