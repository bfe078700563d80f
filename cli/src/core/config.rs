//! # Tarman Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module implements the configuration system for Tarman, handling loading,
//! merging, validation, and access to configuration data. It supports a multi-level
//! configuration approach that combines defaults, user settings, and project-specific
//! overrides.
//!
//! ## Architecture
//!
//! The configuration system follows these principles:
//! - Configuration is loaded from multiple sources in order of precedence
//! - Paths are validated and expanded (e.g., `~` to home directory)
//! - Configuration is validated for correctness before use
//! - Structured data models ensure type safety
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.tarman.toml` in current directory or ancestors
//! 2. User-specific `~/.config/tarman/config.toml`
//! 3. Default values defined in the code
//!
//! ## Examples
//!
//! Loading and using configuration:
//!
//! ```rust
//! let cfg = config::load_config()?;
//!
//! // The global "always extract with directory structure" preference
//! if cfg.extraction.always_full_path { /* ... */ }
//!
//! // Base directory for scratch staging, if the user pinned one
//! let scratch_base = cfg.scratch.directory.as_deref();
//! ```
//!
//! The configuration is loaded once per command execution and passed
//! to the modules that need it.
//!
use crate::core::error::{Result, TarmanError};
use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)] // Error if unknown fields are in TOML
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub scratch: ScratchConfig,
}

/// Configuration for `tarman extract` behavior.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Always extract with full directory structure, even when `--flatten`
    /// was passed on the command line.
    #[serde(default)]
    pub always_full_path: bool,
    /// Default extraction destination used when `-d` is not given (can use ~).
    /// Will be expanded.
    #[serde(default = "default_destination")]
    pub default_destination: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            always_full_path: false,
            default_destination: default_destination(),
        }
    }
}

/// Configuration for the scratch directories used to stage compressed-tar
/// mutation and flattened extraction.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScratchConfig {
    /// Base directory under which scratch directories are created (can use ~).
    /// Defaults to the system temporary directory when unset. Will be expanded.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_destination() -> String {
    ".".to_string()
}

const PROJECT_CONFIG_FILENAME: &str = ".tarman.toml";

/// Loads the effective configuration: user config overlaid by an optional
/// project config, with paths expanded and the result validated.
pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "Tarman", "tarman") {
        let config_dir = proj_dirs.config_dir();
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    if let Some(project_config_path) = find_project_config_path()? {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!(
            "No project configuration file (.tarman.toml) found in current directory or ancestors."
        );
        Ok(None)
    }
}

fn find_project_config_path() -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let mut path: &Path = &current_dir;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        let git_dir = path.join(".git");
        if project_config.exists() && project_config.is_file() {
            return Ok(Some(project_config));
        }
        if git_dir.exists() && git_dir.is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return Ok(None);
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => break,
        }
    }
    Ok(None)
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project settings win over user settings; only fields the project file
/// actually changed (relative to the defaults) take precedence.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project_cfg = match project {
        Some(p) => p,
        None => return user,
    };
    let mut merged = Config::default();
    merged.extraction.always_full_path =
        project_cfg.extraction.always_full_path || user.extraction.always_full_path;
    merged.extraction.default_destination =
        if project_cfg.extraction.default_destination != default_destination() {
            project_cfg.extraction.default_destination
        } else {
            user.extraction.default_destination
        };
    merged.scratch.directory = project_cfg.scratch.directory.or(user.scratch.directory);
    merged
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    config.extraction.default_destination =
        shellexpand::tilde(&config.extraction.default_destination).into_owned();
    if let Some(dir) = config.scratch.directory.take() {
        config.scratch.directory = Some(shellexpand::tilde(&dir).into_owned());
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(dir) = &config.scratch.directory {
        let path = Path::new(dir);
        if path.exists() && !path.is_dir() {
            anyhow::bail!(TarmanError::Config(format!(
                "scratch.directory exists but is not a directory: {}",
                dir
            )));
        }
    }
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_str = r#"
            [extraction]
            always_full_path = true
            default_destination = "~/unpacked"

            [scratch]
            directory = "/var/tmp"
        "#;
        let cfg: Config = toml::from_str(toml_str).expect("Failed to parse TOML");
        assert!(cfg.extraction.always_full_path);
        assert_eq!(cfg.extraction.default_destination, "~/unpacked");
        assert_eq!(cfg.scratch.directory.as_deref(), Some("/var/tmp"));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let cfg: Config = toml::from_str("").expect("Failed to parse empty TOML");
        assert!(!cfg.extraction.always_full_path);
        assert_eq!(cfg.extraction.default_destination, ".");
        assert!(cfg.scratch.directory.is_none());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let toml_str = r#"
            [extraction]
            keep_old_files = true
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn test_path_expansion() -> Result<()> {
        let mut cfg = Config::default();
        cfg.extraction.default_destination = "~/out".to_string();
        cfg.scratch.directory = Some("~/stage".to_string());
        expand_config_paths(&mut cfg)?;
        assert!(!cfg.extraction.default_destination.starts_with('~'));
        assert!(!cfg.scratch.directory.unwrap().starts_with('~'));
        Ok(())
    }

    #[test]
    fn test_merge_project_wins() {
        let mut user = Config::default();
        user.extraction.default_destination = "/home/me/unpacked".into();
        user.scratch.directory = Some("/var/tmp".into());
        let mut project = Config::default();
        project.extraction.always_full_path = true;
        let merged = merge_configs(user, Some(project));
        // Project did not change the destination, so the user value survives.
        assert_eq!(merged.extraction.default_destination, "/home/me/unpacked");
        assert!(merged.extraction.always_full_path);
        assert_eq!(merged.scratch.directory.as_deref(), Some("/var/tmp"));
    }

    #[test]
    fn test_validate_scratch_dir_is_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("not-a-dir");
        fs::write(&file_path, "x")?;
        let mut cfg = Config::default();
        cfg.scratch.directory = Some(file_path.to_string_lossy().into_owned());
        assert!(validate_config(&cfg).is_err());
        Ok(())
    }
}
