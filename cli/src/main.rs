//! # Tarman Main Entry Point
//!
//! File: cli/src/main.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This file serves as the main entry point for the Tarman CLI application.
//! It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to appropriate command handlers
//!
//! ## Architecture
//!
//! The application follows a modular command structure:
//! - Each command (`list`, `add`, `delete`, `extract`, `test`) is defined as a variant in the `Commands` enum
//! - Commands are mapped to handler functions in their respective modules
//! - All errors are propagated to this level for consistent handling
//!
//! ## Examples
//!
//! Basic Tarman usage:
//!
//! ```bash
//! # Get help
//! tarman --help
//!
//! # Run a command with increased verbosity
//! tarman -vv list backup.tar.gz
//! ```
//!
//! Command processing flow:
//! 1. Parse command-line args via Clap
//! 2. Configure logging based on verbosity level
//! 3. Route to appropriate command handler
//! 4. Format and display any errors that occur
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

// Declare the top-level modules of the CLI crate.
mod commands; // Handles specific command logic (list, add, extract, etc.)
mod common; // Contains shared utilities (archive core, fs, process runner)
mod core; // Core infrastructure (errors, config)

/// Defines the top-level command-line arguments structure using Clap's derive macros.
#[derive(Parser, Debug)]
#[command(
    name = "tarman",
    about = "📦 Tarman: tar-family archive manager",
    long_about = "List, add, delete, extract and test tar-family archives (plain tar,\n\
                  tar.bz2/gz/lzma/xz/lzo, and bare compressor streams) by driving the\n\
                  external tar and compressor tools.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Enum defining all available top-level commands.
#[derive(Parser, Debug)]
enum Commands {
    #[command(alias = "l")]
    List(commands::list::ListArgs),
    #[command(alias = "a")]
    Add(commands::add::AddArgs),
    #[command(alias = "d")]
    Delete(commands::delete::DeleteArgs),
    #[command(alias = "x")]
    Extract(commands::extract::ExtractArgs),
    #[command(alias = "t")]
    Test(commands::test::TestArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Use anyhow::Result directly
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::List(args) => commands::list::handle_list(args).await,
        Commands::Add(args) => commands::add::handle_add(args).await,
        Commands::Delete(args) => commands::delete::handle_delete(args).await,
        Commands::Extract(args) => commands::extract::handle_extract(args).await,
        Commands::Test(args) => commands::test::handle_test(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

// --- Basic Integration Tests ---
#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    fn tarman_cmd() -> Command {
        Command::cargo_bin("tarman").expect("Failed to find tarman binary for testing")
    }
    #[test]
    fn test_main_help_flag() {
        tarman_cmd().arg("--help").assert().success();
    }
    #[test]
    fn test_main_version_flag() {
        tarman_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
    #[test]
    fn test_main_unknown_command_fails() {
        tarman_cmd().arg("definitely-not-a-command").assert().failure();
    }
}
