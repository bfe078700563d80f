//! # Tarman Delete Command (`commands::delete`)
//!
//! File: cli/src/commands/delete.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module implements the `tarman delete` subcommand: removing entries
//! from a tar-family archive. Plain tar deletes in place; a compressed tar
//! is staged through the scratch directory because tar cannot delete through
//! the compression layer. Bare compressor streams hold no entries, so the
//! request is rejected here at the command layer — the compiler itself
//! treats it as a silent no-op.
//!
//! ## Architecture
//!
//! 1. Classify the archive by magic numbers.
//! 2. Reject kinds whose capabilities deny delete.
//! 3. Create the scratch directory for compressed tar.
//! 4. Compile and run the delete pipeline; report the failed stage if any.
//!
//! ## Usage
//!
//! ```bash
//! tarman delete backup.tar old-notes.txt
//! tarman delete backup.tar.bz2 stale/report.pdf
//! ```
//!
use crate::commands::{open_archive, pipeline_failure};
use crate::common::archive::pipeline;
use crate::common::fs::scratch;
use crate::core::config;
use crate::core::error::{Result, TarmanError};
use anyhow::bail;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// # Delete Command Arguments (`DeleteArgs`)
///
/// Defines the command-line arguments accepted by the `tarman delete` subcommand.
#[derive(Parser, Debug)]
#[command(about = "Delete entries from a tar-family archive")]
pub struct DeleteArgs {
    /// Path of the archive to modify.
    pub archive: PathBuf,

    /// Entry names to delete, exactly as the listing shows them.
    #[arg(required = true)]
    pub files: Vec<String>,
}

/// # Handle Delete Command (`handle_delete`)
///
/// Asynchronous handler for `tarman delete`.
///
/// ## Arguments
///
/// * `args`: The parsed `DeleteArgs`.
///
/// ## Returns
///
/// * `Result<()>`: `Ok(())` when every pipeline step succeeded.
/// * `Err`: If the kind cannot delete, scratch creation fails, or a
///   pipeline step fails.
pub async fn handle_delete(args: DeleteArgs) -> Result<()> {
    info!("Handling delete command...");
    debug!("Delete args: {:?}", args);

    let cfg = config::load_config()?;
    let mut archive = open_archive(&args.archive)?;

    if !archive.kind.capabilities().can_delete {
        bail!(TarmanError::UnsupportedOperation {
            op: "delete".to_string(),
            kind: archive.kind.to_string(),
        });
    }

    let mut scratch_guard = None;
    if archive.kind.is_compressed_tar() {
        let guard = scratch::create_scratch_dir(cfg.scratch.directory.as_deref().map(Path::new))?;
        archive.scratch_dir = Some(guard.path().to_path_buf());
        scratch_guard = Some(guard);
    }

    let compiled = pipeline::compile_delete(&mut archive, &args.files)?;
    if compiled.is_empty() {
        // Defensive: the capability check above already rejected this.
        bail!(TarmanError::UnsupportedOperation {
            op: "delete".to_string(),
            kind: archive.kind.to_string(),
        });
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
    println!(
        "✅ Deleted {} entr{} from {}",
        args.files.len(),
        if args.files.len() == 1 { "y" } else { "ies" },
        args.archive.display()
    );
    Ok(())
}
