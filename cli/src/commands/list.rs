//! # Tarman List Command (`commands::list`)
//!
//! File: cli/src/commands/list.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module implements the `tarman list` subcommand. It runs the
//! archive's verbose listing through the external tool, parses every line
//! into a typed entry, and prints the entries plus a count/size summary.
//!
//! ## Architecture
//!
//! 1. Classify the archive by magic numbers.
//! 2. Compile the list pipeline (`tar -tvf` with the kind's compression
//!    flags). Bare compressor streams have no listable entries, so for them
//!    the compiler emits nothing and a single pseudo-entry is synthesized
//!    from file metadata instead.
//! 3. Stream each stdout line through the listing parser, accumulating the
//!    entry count and total size on the descriptor.
//! 4. Print the parsed entries and the summary.
//!
//! ## Usage
//!
//! ```bash
//! tarman list backup.tar.gz
//! tarman -v list backup.tar       # with info-level logging
//! ```
//!
use crate::commands::{open_archive, pipeline_failure};
use crate::common::archive::listing::{self, Entry, Listing};
use crate::common::archive::pipeline;
use crate::core::error::Result;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

/// # List Command Arguments (`ListArgs`)
///
/// Defines the command-line arguments accepted by the `tarman list` subcommand.
#[derive(Parser, Debug)]
#[command(about = "List the contents of an archive")]
pub struct ListArgs {
    /// Path of the archive to list.
    pub archive: PathBuf,
}

/// # Handle List Command (`handle_list`)
///
/// Asynchronous handler for `tarman list`: runs the listing tool, parses its
/// output line-by-line, and prints the structured result.
///
/// ## Arguments
///
/// * `args`: The parsed `ListArgs` with the archive path.
///
/// ## Returns
///
/// * `Result<()>`: `Ok(())` when the listing completed.
/// * `Err`: If the archive cannot be classified or the listing tool fails.
pub async fn handle_list(args: ListArgs) -> Result<()> {
    info!("Handling list command...");
    debug!("List args: {:?}", args);

    let mut archive = open_archive(&args.archive)?;
    let compiled = pipeline::compile_list(&archive);

    if compiled.is_empty() {
        // A bare compressor stream holds exactly one file; present it from
        // metadata since no tool emits a parseable listing for it.
        let metadata = std::fs::metadata(&archive.source_path)
            .with_context(|| format!("Failed to stat {}", archive.source_path.display()))?;
        let name = pipeline::decompressed_file_name(&archive.source_path);
        println!("{:>12}  {}", metadata.len(), name);
        println!("1 entry, {} compressed bytes", metadata.len());
        return Ok(());
    }

    let mut parsed = Listing::default();
    let working_dir = archive.working_dir.clone();
    let outcome = crate::common::process::run_pipeline(&compiled, working_dir.as_deref(), |line| {
        if line.trim().is_empty() {
            return;
        }
        let entry = listing::parse_listing_line(line, &mut archive);
        parsed.push(entry);
    })
    .await?;

    if !outcome.success {
        return Err(pipeline_failure(outcome));
    }

    for entry in parsed.entries() {
        print_entry(entry);
    }
    println!(
        "{} entries, {} bytes",
        archive.file_count, archive.total_size
    );
    Ok(())
}

/// Prints one parsed entry the way the verbose listing laid it out, with the
/// normalized name and the symlink target made explicit.
fn print_entry(entry: &Entry) {
    let mut row = format!(
        "{} {} {:>10} {} {} {}",
        entry.permissions, entry.owner_group, entry.size, entry.date, entry.time, entry.name
    );
    if let Some(target) = &entry.link_target {
        row.push_str(" -> ");
        row.push_str(target);
    }
    println!("{row}");
}
