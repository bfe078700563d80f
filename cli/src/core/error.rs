//! # Tarman Error Types
//!
//! File: cli/src/core/error.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module defines the error types and error handling mechanisms used throughout
//! the Tarman application. It provides a consistent approach to error management
//! with detailed error information and context.
//!
//! ## Architecture
//!
//! The error system consists of two main components:
//! - `TarmanError`: A custom error enum using `thiserror` for specific error types
//! - `Result<T>`: A type alias for `anyhow::Result<T>` for flexible error handling
//!
//! The error types cover various domains:
//! - Archive detection/open errors
//! - Operations a given archive kind cannot perform
//! - Scratch-directory staging errors
//! - External command (child process) failures
//! - Configuration errors
//!
//! ## Examples
//!
//! Using the error system:
//!
//! ```rust
//! // Return a specific error type
//! if !path.exists() {
//!     return Err(TarmanError::FileSystem(format!("Path not found: {}", path.display())))?;
//! }
//!
//! // Add context to errors using anyhow
//! let file = File::open(&path)
//!     .with_context(|| format!("Failed to open archive: {}", path.display()))?;
//! ```
//!
//! The error system provides detailed error messages to the user and
//! includes context information for debugging.
//!
use thiserror::Error;

/// Custom error type for the Tarman application.
#[derive(Error, Debug)]
pub enum TarmanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Operation '{op}' is not supported for {kind} archives.")]
    UnsupportedOperation { op: String, kind: String },

    #[error("Scratch directory error: {0}")]
    Scratch(String),

    #[error(
        "External command failed at stage '{stage}': {cmd}, Status: {status}, Output:\n{output}"
    )]
    ExternalCommand {
        cmd: String,
        stage: String,
        status: String,
        output: String,
    },

    #[error("Listing parse error: {0}")]
    Parse(String),

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
/// Anyhow allows for easy context addition and flexible error handling.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let config_err = TarmanError::Config("Missing setting 'foo'".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing setting 'foo'"
        );

        let unsupported = TarmanError::UnsupportedOperation {
            op: "delete".into(),
            kind: "gzip".into(),
        };
        assert_eq!(
            unsupported.to_string(),
            "Operation 'delete' is not supported for gzip archives."
        );

        let scratch = TarmanError::Scratch("could not create /tmp/tarman-xyz".into());
        assert_eq!(
            scratch.to_string(),
            "Scratch directory error: could not create /tmp/tarman-xyz"
        );
    }

    #[test]
    fn test_external_command_display_names_stage() {
        let err = TarmanError::ExternalCommand {
            cmd: "tar -rvvf /tmp/s/tarman-tmp.tar notes.txt".into(),
            stage: "mutate-scratch".into(),
            status: "exit status: 2".into(),
            output: "tar: notes.txt: No such file or directory".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("stage 'mutate-scratch'"));
        assert!(rendered.contains("exit status: 2"));
    }
}
