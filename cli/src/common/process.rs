//! # Tarman Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module executes the `CommandPipeline`s produced by the pipeline
//! compiler. It is the single place where external processes are spawned:
//! one child at a time, strictly in pipeline order, with the remaining steps
//! abandoned at the first non-zero exit status. No compensating rollback is
//! performed — a partially-applied pipeline leaves the archive in whatever
//! state the completed prefix produced, which the staging procedure is
//! designed around (its only destructive step is the last one).
//!
//! ## Architecture
//!
//! For each step the runner:
//! - spawns `tokio::process::Command` with the step's argument vector (no
//!   shell is ever involved, so file names need no quoting),
//! - honors the step's working directory, falling back to the pipeline-wide
//!   default (the archive's `working_dir` during staged operations),
//! - either redirects stdout into the step's `stdout_to` file or streams it
//!   line-by-line to the caller's callback (which feeds the listing parser
//!   for list/test operations),
//! - captures stderr for diagnostics.
//!
//! The result is a `PipelineOutcome`: overall success, the captured text,
//! and — on failure — exactly which stage broke, with the rendered command
//! and exit status. Failure to *spawn* (tool not installed) is a hard error
//! instead, since no meaningful partial state exists.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::process;
//!
//! let outcome = process::run_pipeline(&pipeline, archive.working_dir.as_deref(), |line| {
//!     let entry = listing::parse_listing_line(line, &mut archive);
//!     listing.push(entry);
//! })
//! .await?;
//! if !outcome.success { /* report outcome.failure */ }
//! ```
//!
use crate::common::archive::pipeline::{CommandPipeline, CommandStep, Stage};
use crate::core::error::Result;
use anyhow::Context;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, warn};

/// Details of the step that broke a pipeline.
#[derive(Debug, Clone)]
pub struct StepFailure {
    /// Which stage of the pipeline failed.
    pub stage: Stage,
    /// The rendered command line, for display.
    pub command: String,
    /// The child's exit status, rendered.
    pub status: String,
}

/// The result of running one pipeline to completion or first failure.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// True when every step exited successfully.
    pub success: bool,
    /// Present when a step exited non-zero; the remaining steps did not run.
    pub failure: Option<StepFailure>,
    /// Accumulated stdout and stderr text of the steps that ran.
    pub output: String,
}

/// Runs the pipeline's steps sequentially, aborting at the first non-zero
/// exit status.
///
/// `default_dir` is the working directory for steps that do not carry their
/// own (the archive's scratch directory during staged operations). Each
/// stdout line of a non-redirected step is handed to `on_stdout_line` as it
/// arrives.
pub async fn run_pipeline<F>(
    pipeline: &CommandPipeline,
    default_dir: Option<&Path>,
    mut on_stdout_line: F,
) -> Result<PipelineOutcome>
where
    F: FnMut(&str),
{
    let mut output = String::new();

    for step in pipeline.steps() {
        debug!("Running stage '{}': {}", step.stage, step.rendered());

        let status = run_step(step, default_dir, &mut output, &mut on_stdout_line).await?;

        if !status.success() {
            warn!(
                "Stage '{}' failed with {}; aborting remaining steps",
                step.stage, status
            );
            return Ok(PipelineOutcome {
                success: false,
                failure: Some(StepFailure {
                    stage: step.stage,
                    command: step.rendered(),
                    status: status.to_string(),
                }),
                output,
            });
        }
    }

    Ok(PipelineOutcome {
        success: true,
        failure: None,
        output,
    })
}

/// Spawns one step and drains its output. Returns the child's exit status.
async fn run_step<F>(
    step: &CommandStep,
    default_dir: Option<&Path>,
    output: &mut String,
    on_stdout_line: &mut F,
) -> Result<std::process::ExitStatus>
where
    F: FnMut(&str),
{
    let mut command = tokio::process::Command::new(&step.program);
    command.args(&step.args);
    command.stdin(Stdio::null());
    command.stderr(Stdio::piped());

    if let Some(dir) = step.current_dir.as_deref().or(default_dir) {
        command.current_dir(dir);
    }

    // The one piece of shell plumbing the pipelines need: compressor `-c`
    // output into the target file. Everything else is piped back to us.
    let redirected = match &step.stdout_to {
        Some(target) => {
            let file = std::fs::File::create(target).with_context(|| {
                format!("Failed to create output file {}", target.display())
            })?;
            command.stdout(Stdio::from(file));
            true
        }
        None => {
            command.stdout(Stdio::piped());
            false
        }
    };

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn '{}'", step.rendered()))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Drain both streams concurrently so neither pipe can fill up and stall
    // the child while we wait on the other.
    let stdout_task = async {
        let mut text = String::new();
        if let Some(stream) = stdout {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                on_stdout_line(&line);
                text.push_str(&line);
                text.push('\n');
            }
        }
        text
    };
    let stderr_task = async {
        let mut text = String::new();
        if let Some(mut stream) = stderr {
            let _ = stream.read_to_string(&mut text).await;
        }
        text
    };
    let (stdout_text, stderr_text) = tokio::join!(stdout_task, stderr_task);

    if !redirected {
        output.push_str(&stdout_text);
    }
    output.push_str(&stderr_text);

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for '{}'", step.rendered()))?;
    Ok(status)
}
