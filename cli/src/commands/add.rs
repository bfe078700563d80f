//! # Tarman Add Command (`commands::add`)
//!
//! File: cli/src/commands/add.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module implements the `tarman add` subcommand. Depending on the
//! archive kind and whether the target already exists, "add" means one of:
//! - create a brand-new tar-family archive from the selection,
//! - append (or, with `--update`, update) entries of an existing plain tar,
//! - stage a mutation of an existing compressed tar through the scratch
//!   directory (copy, decompress, mutate, recompress, move back),
//! - compress a single file into a bare compressor stream.
//!
//! ## Architecture
//!
//! The handler classifies the target (magic numbers when it exists, file
//! name when it does not), validates the requested flags against the kind's
//! capabilities, creates a scratch directory when staging is needed, and
//! hands the compiled pipeline to the process runner. The scratch guard
//! lives until the pipeline finished so a failed staging run is cleaned up
//! with it.
//!
//! ## Usage
//!
//! ```bash
//! tarman add backup.tar notes.txt src/
//! tarman add backup.tar.gz --update notes.txt
//! tarman add notes.txt.xz --level 9 notes.txt
//! ```
//!
use crate::commands::pipeline_failure;
use crate::common::archive::{detect, pipeline, ArchiveDescriptor, ArchiveKind};
use crate::common::fs::scratch;
use crate::core::config;
use crate::core::error::{Result, TarmanError};
use anyhow::bail;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// # Add Command Arguments (`AddArgs`)
///
/// Defines the command-line arguments accepted by the `tarman add` subcommand.
#[derive(Parser, Debug)]
#[command(about = "Add files to an archive, creating it if necessary")]
pub struct AddArgs {
    /// Path of the target archive.
    pub archive: PathBuf,

    /// Files and directories to add.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Update entries newer than the archived copies instead of appending.
    #[arg(long)]
    pub update: bool,

    /// Delete the source files after they were added successfully.
    #[arg(long = "move-files")]
    pub move_files: bool,

    /// Do not descend into directories; add only the named paths.
    #[arg(long)]
    pub no_recursion: bool,

    /// Compression preset for xz streams (1-9, default 5).
    #[arg(long, short = 'l')]
    pub level: Option<u32>,
}

/// # Handle Add Command (`handle_add`)
///
/// Asynchronous handler for `tarman add`: classifies the target, validates
/// flags against the kind's capabilities, stages when required, and runs the
/// compiled pipeline.
///
/// ## Arguments
///
/// * `args`: The parsed `AddArgs`.
///
/// ## Returns
///
/// * `Result<()>`: `Ok(())` when every pipeline step succeeded.
/// * `Err`: On classification failure, capability violations, scratch
///   creation failure, or a failed pipeline step.
pub async fn handle_add(args: AddArgs) -> Result<()> {
    info!("Handling add command...");
    debug!("Add args: {:?}", args);

    let cfg = config::load_config()?;
    let kind = classify_add_target(&args.archive)?;
    let caps = kind.capabilities();

    if !caps.can_add {
        bail!(unsupported("add", kind));
    }
    if args.update && !caps.can_update {
        bail!(unsupported("update", kind));
    }
    if args.move_files && !caps.can_move {
        bail!(unsupported("move-files", kind));
    }
    if args.no_recursion && !caps.can_recurse {
        bail!(unsupported("no-recursion", kind));
    }
    if kind.is_pure_compressor() && args.files.len() != 1 {
        bail!(TarmanError::Archive(format!(
            "a {kind} stream holds a single file; got {} inputs",
            args.files.len()
        )));
    }

    let mut archive = ArchiveDescriptor::new(kind, &args.archive);
    archive.do_update = args.update;
    archive.do_move = args.move_files;
    archive.do_recurse = !args.no_recursion;

    // Mutating an existing compressed tar needs the scratch staging area;
    // the guard keeps the directory alive until the pipeline finished.
    let mut scratch_guard = None;
    if kind.is_compressed_tar() && archive.archive_path.exists() {
        let guard = scratch::create_scratch_dir(cfg.scratch.directory.as_deref().map(Path::new))?;
        archive.scratch_dir = Some(guard.path().to_path_buf());
        scratch_guard = Some(guard);
    }

    let compiled = pipeline::compile_add(&mut archive, &args.files, args.level)?;
    let working_dir = archive.working_dir.clone();
    let outcome = crate::common::process::run_pipeline(&compiled, working_dir.as_deref(), |line| {
        println!("{line}");
    })
    .await?;
    archive.reset_working_dir();
    drop(scratch_guard);

    if !outcome.success {
        return Err(pipeline_failure(outcome));
    }
    println!(
        "✅ Added {} path(s) to {}",
        args.files.len(),
        args.archive.display()
    );
    Ok(())
}

/// Kind of the add target: sniffed from content when the archive exists,
/// derived from the file name when it is about to be created.
fn classify_add_target(path: &Path) -> Result<ArchiveKind> {
    if path.exists() {
        detect::detect_kind(path)
    } else {
        ArchiveKind::from_file_name(path).ok_or_else(|| {
            TarmanError::Archive(format!(
                "cannot tell the archive kind of new file {} from its name",
                path.display()
            ))
            .into()
        })
    }
}

fn unsupported(op: &str, kind: ArchiveKind) -> TarmanError {
    TarmanError::UnsupportedOperation {
        op: op.to_string(),
        kind: kind.to_string(),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    /// Test argument parsing, including the flag set.
    #[test]
    fn test_add_args_parsing() {
        let args = AddArgs::try_parse_from([
            "add",
            "backup.tar",
            "notes.txt",
            "src",
            "--update",
            "--move-files",
            "--no-recursion",
            "-l",
            "9",
        ])
        .expect("Parsing add args failed");
        assert_eq!(args.archive, PathBuf::from("backup.tar"));
        assert_eq!(args.files, vec!["notes.txt".to_string(), "src".to_string()]);
        assert!(args.update);
        assert!(args.move_files);
        assert!(args.no_recursion);
        assert_eq!(args.level, Some(9));

        // At least one file is required.
        assert!(AddArgs::try_parse_from(["add", "backup.tar"]).is_err());
    }

    /// Test the file-name fallback for archives that do not exist yet.
    #[test]
    fn test_classify_add_target_new_archive() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let fresh = dir.path().join("fresh.tar.xz");
        assert_eq!(classify_add_target(&fresh)?, ArchiveKind::TarXz);

        let nameless = dir.path().join("fresh.dat");
        assert!(classify_add_target(&nameless).is_err());
        Ok(())
    }
}
