//! # Tarman Extract Command (`commands::extract`)
//!
//! File: cli/src/commands/extract.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module implements the `tarman extract` subcommand. By default the
//! archive's directory structure is reproduced under the destination; with
//! `--flatten` every selected entry lands directly in the destination
//! instead, which tar cannot do natively — the extraction is staged through
//! the scratch directory and each extracted path is relocated afterwards.
//! Bare compressor streams decompress to a derived file name.
//!
//! ## Architecture
//!
//! 1. Classify the archive and validate flags against its capabilities.
//! 2. Resolve the destination (argument, else the configured default) and
//!    make sure it exists.
//! 3. For a flatten with no explicit selection: populate the in-memory
//!    listing first by running the list pipeline, because an empty selection
//!    means "everything" and must be resolved to concrete names.
//! 4. Compile and run the extract pipeline; report the failed stage if any.
//!
//! The `extraction.always_full_path` config preference overrides
//! `--flatten`, mirroring a global "always keep directory structure" choice.
//!
//! ## Usage
//!
//! ```bash
//! tarman extract backup.tar.gz -d ./unpacked
//! tarman extract backup.tar --flatten docs/readme.md
//! tarman extract notes.txt.gz -d .
//! ```
//!
use crate::commands::{open_archive, pipeline_failure};
use crate::common::archive::listing::{self, Listing};
use crate::common::archive::pipeline;
use crate::common::fs::{io, scratch};
use crate::core::config;
use crate::core::error::{Result, TarmanError};
use anyhow::bail;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// # Extract Command Arguments (`ExtractArgs`)
///
/// Defines the command-line arguments accepted by the `tarman extract` subcommand.
#[derive(Parser, Debug)]
#[command(about = "Extract entries from an archive")]
pub struct ExtractArgs {
    /// Path of the archive to extract from.
    pub archive: PathBuf,

    /// Entries to extract; everything when omitted.
    pub files: Vec<String>,

    /// Destination directory (configured default otherwise).
    #[arg(long, short = 'd')]
    pub destination: Option<PathBuf>,

    /// Drop directory structure: every entry lands directly in the destination.
    #[arg(long)]
    pub flatten: bool,

    /// Overwrite existing files instead of keeping them.
    #[arg(long)]
    pub overwrite: bool,

    /// Restore the archived modification times.
    #[arg(long)]
    pub touch: bool,
}

/// # Handle Extract Command (`handle_extract`)
///
/// Asynchronous handler for `tarman extract`.
///
/// ## Arguments
///
/// * `args`: The parsed `ExtractArgs`.
///
/// ## Returns
///
/// * `Result<()>`: `Ok(())` when extraction completed (or there was nothing
///   to extract).
/// * `Err`: On classification failure, capability violations, scratch
///   creation failure, or a failed pipeline step.
pub async fn handle_extract(args: ExtractArgs) -> Result<()> {
    info!("Handling extract command...");
    debug!("Extract args: {:?}", args);

    let cfg = config::load_config()?;
    let mut archive = open_archive(&args.archive)?;
    let caps = archive.kind.capabilities();

    if !caps.can_extract {
        bail!(unsupported("extract", &archive.kind.to_string()));
    }
    if args.touch && !caps.can_touch {
        bail!(unsupported("touch", &archive.kind.to_string()));
    }
    if args.overwrite && !caps.can_overwrite {
        bail!(unsupported("overwrite", &archive.kind.to_string()));
    }
    if args.flatten && !caps.can_full_path {
        bail!(unsupported("flatten", &archive.kind.to_string()));
    }

    let destination = args
        .destination
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.extraction.default_destination));
    io::ensure_dir_exists(&destination)?;

    archive.extraction_path = Some(destination.clone());
    archive.do_overwrite = args.overwrite;
    archive.do_touch = args.touch;
    archive.do_full_path = !args.flatten;
    let always_full_path = cfg.extraction.always_full_path;

    // Flattened extraction stages through scratch; keep the guard alive
    // until the pipeline (including the relocation steps) finished.
    let flattening = args.flatten && !always_full_path && archive.kind.is_tar_family();
    let mut scratch_guard = None;
    if flattening {
        let guard = scratch::create_scratch_dir(cfg.scratch.directory.as_deref().map(Path::new))?;
        archive.scratch_dir = Some(guard.path().to_path_buf());
        scratch_guard = Some(guard);
    }

    // An empty selection means "everything"; for flattening that set must be
    // resolved from the in-memory listing before the extract command exists.
    let mut known = Listing::default();
    if flattening && args.files.is_empty() {
        let list_pipeline = pipeline::compile_list(&archive);
        let outcome = crate::common::process::run_pipeline(&list_pipeline, None, |line| {
            if line.trim().is_empty() {
                return;
            }
            let entry = listing::parse_listing_line(line, &mut archive);
            known.push(entry);
        })
        .await?;
        if !outcome.success {
            return Err(pipeline_failure(outcome));
        }
        if known.is_empty() {
            debug!("Archive listing is empty; nothing to resolve");
        } else {
            debug!("Resolved empty selection to {} entries", known.len());
        }
    }

    let compiled = pipeline::compile_extract(&mut archive, &args.files, &known, always_full_path)?;
    if compiled.is_empty() {
        println!("Nothing to extract.");
        return Ok(());
    }

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
    println!("✅ Extracted to {}", destination.display());
    Ok(())
}

fn unsupported(op: &str, kind: &str) -> TarmanError {
    TarmanError::UnsupportedOperation {
        op: op.to_string(),
        kind: kind.to_string(),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    /// Test argument parsing, including defaults.
    #[test]
    fn test_extract_args_parsing() {
        let args = ExtractArgs::try_parse_from([
            "extract",
            "backup.tar.gz",
            "docs/readme.md",
            "-d",
            "/tmp/out",
            "--flatten",
            "--overwrite",
            "--touch",
        ])
        .expect("Parsing extract args failed");
        assert_eq!(args.archive, PathBuf::from("backup.tar.gz"));
        assert_eq!(args.files, vec!["docs/readme.md".to_string()]);
        assert_eq!(args.destination, Some(PathBuf::from("/tmp/out")));
        assert!(args.flatten);
        assert!(args.overwrite);
        assert!(args.touch);

        // Everything optional but the archive.
        let bare = ExtractArgs::try_parse_from(["extract", "backup.tar"])
            .expect("Parsing bare extract args failed");
        assert!(bare.files.is_empty());
        assert!(bare.destination.is_none());
        assert!(!bare.flatten);
    }
}
