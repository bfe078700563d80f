//! # Tarman Pipeline Compiler (`common::archive::pipeline`)
//!
//! File: cli/src/common/archive/pipeline.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module compiles a requested archive operation — add, delete,
//! extract, test, list — against an `ArchiveDescriptor` and a file selection
//! into a `CommandPipeline`: the ordered list of external-tool invocations
//! that performs the operation. The compiler never runs anything; execution
//! belongs to `common::process`.
//!
//! ## Architecture
//!
//! Two facts shape every pipeline this module emits:
//!
//! 1. **Compressed tar archives cannot be mutated in place.** `tar` cannot
//!    append to or delete from an archive through a compression layer, so
//!    any mutation of a `.tar.gz`-style archive is staged: copy the archive
//!    into a scratch directory, decompress it there, run the tar mutation on
//!    the plain tar, recompress, and move the result back over the original.
//!    The move is the only destructive step and deliberately the last one —
//!    a failure anywhere earlier leaves the original archive untouched.
//!
//! 2. **`tar` has no "flatten paths" switch.** Extracting without directory
//!    structure is simulated by extracting into the scratch directory and
//!    then relocating each extracted path into the real destination.
//!
//! Commands are structured argument vectors, not shell strings: each
//! `CommandStep` carries a program, its arguments, an optional stdout
//! redirection target (the one shell feature the compressor pipelines need),
//! an optional working directory, and a typed `Stage` label so a failed run
//! can report exactly which step broke.
//!
//! ## Usage
//!
//! ```rust
//! let mut archive = ArchiveDescriptor::new(ArchiveKind::TarGzip, path);
//! archive.scratch_dir = Some(scratch.path().to_path_buf());
//! let pipeline = pipeline::compile_delete(&mut archive, &selection)?;
//! // hand `pipeline` to common::process::run_pipeline
//! ```
//!
use crate::common::archive::listing::Listing;
use crate::common::archive::{ArchiveDescriptor, ArchiveKind};
use crate::core::error::{Result, TarmanError};
use std::fmt;
use std::path::{Path, PathBuf};

/// Fixed base name of the staged archive copy inside the scratch directory.
/// The compressor's canonical extension is appended while it is compressed.
pub const SCRATCH_TAR: &str = "tarman-tmp.tar";

/// Default xz preset when the caller did not pick one.
const DEFAULT_XZ_LEVEL: u32 = 5;

/// Typed label describing what a step does, so the runner can report which
/// stage of a pipeline failed rather than only that the pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Copy the compressed archive into the scratch directory.
    CopyToScratch,
    /// Decompress the scratch copy in place.
    DecompressScratch,
    /// Run the tar mutation against the decompressed scratch copy.
    MutateScratch,
    /// Recompress the scratch copy.
    RecompressScratch,
    /// Move the recompressed copy back over the real archive. The only
    /// destructive step of a staged mutation.
    CommitScratch,
    /// Create a brand-new archive.
    Create,
    /// Append entries to an existing archive.
    Append,
    /// Update entries of an existing archive.
    Update,
    /// Delete entries from an archive.
    Delete,
    /// Extract entries.
    Extract,
    /// Move one extracted path from scratch to the final destination.
    Relocate,
    /// Compress a single file into a bare compressor stream.
    Compress,
    /// Decompress a bare compressor stream.
    Decompress,
    /// List the archive contents verbosely.
    List,
    /// Integrity-check the archive.
    Test,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::CopyToScratch => "copy-to-scratch",
            Stage::DecompressScratch => "decompress-scratch",
            Stage::MutateScratch => "mutate-scratch",
            Stage::RecompressScratch => "recompress-scratch",
            Stage::CommitScratch => "commit-scratch",
            Stage::Create => "create",
            Stage::Append => "append",
            Stage::Update => "update",
            Stage::Delete => "delete",
            Stage::Extract => "extract",
            Stage::Relocate => "relocate",
            Stage::Compress => "compress",
            Stage::Decompress => "decompress",
            Stage::List => "list",
            Stage::Test => "test",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One external-tool invocation: program, argument vector, and the typed
/// description of any shell-level plumbing it needs. Filenames inside `args`
/// are passed verbatim to the child process — no shell ever sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub stage: Stage,
    pub program: String,
    pub args: Vec<String>,
    /// Redirect the child's stdout into this file (compressor `-c` output).
    pub stdout_to: Option<PathBuf>,
    /// Working directory for this step; falls back to the runner's default.
    pub current_dir: Option<PathBuf>,
}

impl CommandStep {
    fn new(stage: Stage, program: &str) -> Self {
        CommandStep {
            stage,
            program: program.to_string(),
            args: Vec::new(),
            stdout_to: None,
            current_dir: None,
        }
    }

    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    fn stdout_to(mut self, path: PathBuf) -> Self {
        self.stdout_to = Some(path);
        self
    }

    fn in_dir(mut self, dir: PathBuf) -> Self {
        self.current_dir = Some(dir);
        self
    }

    /// Human-readable rendering for logs and error reports. Not suitable for
    /// handing to a shell; execution always goes through the argv.
    pub fn rendered(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        if let Some(target) = &self.stdout_to {
            out.push_str(" > ");
            out.push_str(&target.to_string_lossy());
        }
        out
    }
}

/// An ordered list of command steps. The runner executes them strictly in
/// order and aborts the remainder at the first non-zero exit status; no
/// compensating rollback is performed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandPipeline {
    steps: Vec<CommandStep>,
}

impl CommandPipeline {
    pub(crate) fn push(&mut self, step: CommandStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[CommandStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

/// Which tar mutation a staged pipeline performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MutationMode {
    Add,
    Delete,
}

/// The single-letter compression flag tar accepts inline (`j`, `z`), or the
/// `--use-compress-program=` argument for the compressors without one.
fn compression_letter(kind: ArchiveKind) -> Option<char> {
    match kind {
        ArchiveKind::TarBzip2 => Some('j'),
        ArchiveKind::TarGzip => Some('z'),
        _ => None,
    }
}

fn compress_program_arg(kind: ArchiveKind) -> Option<String> {
    match kind {
        ArchiveKind::TarLzma | ArchiveKind::TarXz | ArchiveKind::TarLzop => kind
            .compressor_program()
            .map(|tool| format!("--use-compress-program={tool}")),
        _ => None,
    }
}

/// The tar argument(s) selecting operation and compression: `-cvvjf`,
/// `-xzvf`, `--use-compress-program=xz -tvf` and so on. `op` is one of
/// `c`/`x`/`t`; create uses double verbosity like the mutating commands.
fn tar_mode_args(kind: ArchiveKind, op: char) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(program_arg) = compress_program_arg(kind) {
        args.push(program_arg);
    }
    let letter = compression_letter(kind).map(String::from).unwrap_or_default();
    let cluster = match op {
        'c' => format!("-cvv{letter}f"),
        'x' => format!("-x{letter}vf"),
        _ => format!("-t{letter}vf"),
    };
    args.push(cluster);
    args
}

/// The `--no-recursion` / `--remove-files` prefix shared by every add
/// command.
fn add_prefix_args(archive: &ArchiveDescriptor) -> Vec<String> {
    let mut args = Vec::new();
    if !archive.do_recurse {
        args.push("--no-recursion".to_string());
    }
    if archive.do_move {
        args.push("--remove-files".to_string());
    }
    args
}

/// Overwrite-vs-keep flags for extraction. BSD tar on FreeBSD overwrites by
/// default and spells keep-old-files `-k`; GNU tar wants an explicit flag
/// either way.
fn overwrite_args(archive: &ArchiveDescriptor) -> Vec<String> {
    if cfg!(target_os = "freebsd") {
        if archive.do_overwrite {
            Vec::new()
        } else {
            vec!["-k".to_string()]
        }
    } else if archive.do_overwrite {
        vec!["--overwrite".to_string()]
    } else {
        vec!["--keep-old-files".to_string()]
    }
}

/// Compiles an `add` operation.
///
/// Plain tar appends/updates in place; a compressed tar that already exists
/// goes through the scratch staging; a target that does not exist yet is
/// created outright. For the bare compressors "add" means compressing the
/// single selected file into the target path.
pub fn compile_add(
    archive: &mut ArchiveDescriptor,
    files: &[String],
    level: Option<u32>,
) -> Result<CommandPipeline> {
    if archive.kind.is_pure_compressor() {
        return compile_compress(archive, files, level);
    }

    let exists = archive.archive_path.exists();
    if archive.kind.is_compressed_tar() && exists {
        return compile_staged_mutation(archive, files, MutationMode::Add);
    }

    let mut pipeline = CommandPipeline::default();
    if exists {
        // Plain tar supports direct in-place append/update.
        let (stage, flag) = if archive.do_update {
            (Stage::Update, "-uvvf")
        } else {
            (Stage::Append, "-rvvf")
        };
        pipeline.push(
            CommandStep::new(stage, "tar")
                .args(add_prefix_args(archive))
                .arg(flag)
                .path_arg(&archive.archive_path)
                .args(files.iter().cloned()),
        );
    } else {
        pipeline.push(
            CommandStep::new(Stage::Create, "tar")
                .args(add_prefix_args(archive))
                .args(tar_mode_args(archive.kind, 'c'))
                .path_arg(&archive.archive_path)
                .args(files.iter().cloned()),
        );
    }
    Ok(pipeline)
}

/// Whole-file compression into the target path for the bare compressor
/// kinds. Only a single input is meaningful; anything else is rejected.
fn compile_compress(
    archive: &ArchiveDescriptor,
    files: &[String],
    level: Option<u32>,
) -> Result<CommandPipeline> {
    let [file] = files else {
        return Err(TarmanError::Archive(format!(
            "compressing into a {} stream takes exactly one source file, got {}",
            archive.kind,
            files.len()
        ))
        .into());
    };
    let tool = archive
        .kind
        .compressor_program()
        .expect("pure compressor kinds always have a tool");

    let mut step = CommandStep::new(Stage::Compress, tool);
    if archive.kind == ArchiveKind::Xz {
        step = step.arg(format!("-{}", level.unwrap_or(DEFAULT_XZ_LEVEL)));
    }
    let step = step
        .arg("-c")
        .arg(file.clone())
        .stdout_to(archive.archive_path.clone());

    let mut pipeline = CommandPipeline::default();
    pipeline.push(step);
    Ok(pipeline)
}

/// Compiles a `delete` operation.
///
/// Plain tar deletes in place; compressed tar stages; the bare compressors
/// have no entries to delete, so the pipeline is empty and the decision to
/// reject the request is left to the caller.
pub fn compile_delete(archive: &mut ArchiveDescriptor, files: &[String]) -> Result<CommandPipeline> {
    if archive.kind.is_pure_compressor() {
        return Ok(CommandPipeline::default());
    }
    if archive.kind.is_compressed_tar() {
        return compile_staged_mutation(archive, files, MutationMode::Delete);
    }

    let mut pipeline = CommandPipeline::default();
    pipeline.push(
        CommandStep::new(Stage::Delete, "tar")
            .arg("--delete")
            .arg("-vf")
            .path_arg(&archive.archive_path)
            .args(files.iter().cloned()),
    );
    Ok(pipeline)
}

/// The five-step staging procedure for mutating a compressed tar archive.
///
/// 1. copy the archive into the scratch directory under a fixed name,
/// 2. decompress that copy in place,
/// 3. run the tar mutation against the plain scratch tar,
/// 4. recompress the scratch tar,
/// 5. move the recompressed copy back over the real archive.
///
/// Step 5 is the only destructive point; a failure in steps 1-4 leaves the
/// original archive untouched and the scratch copy is simply discarded.
fn compile_staged_mutation(
    archive: &mut ArchiveDescriptor,
    files: &[String],
    mode: MutationMode,
) -> Result<CommandPipeline> {
    let scratch = archive
        .scratch_dir
        .clone()
        .ok_or_else(|| TarmanError::Scratch("no scratch directory for staged mutation".into()))?;
    let tool = archive.kind.compressor_program().ok_or_else(|| {
        TarmanError::Archive(format!("{} is not a compressed tar", archive.kind))
    })?;
    let extension = archive
        .kind
        .scratch_extension()
        .expect("compressed tar kinds always have an extension");

    let compressed_copy = scratch.join(format!("{SCRATCH_TAR}.{extension}"));
    let plain_copy = scratch.join(SCRATCH_TAR);

    archive.working_dir = Some(scratch);

    let mut pipeline = CommandPipeline::default();
    pipeline.push(
        CommandStep::new(Stage::CopyToScratch, "cp")
            .arg("-a")
            .path_arg(&archive.archive_path)
            .path_arg(&compressed_copy),
    );
    pipeline.push(
        CommandStep::new(Stage::DecompressScratch, tool)
            .arg("-f")
            .arg("-d")
            .path_arg(&compressed_copy),
    );
    match mode {
        MutationMode::Add => {
            let flag = if archive.do_update { "-uvvf" } else { "-rvvf" };
            pipeline.push(
                CommandStep::new(Stage::MutateScratch, "tar")
                    .args(add_prefix_args(archive))
                    .arg(flag)
                    .path_arg(&plain_copy)
                    .args(files.iter().cloned()),
            );
        }
        MutationMode::Delete => {
            pipeline.push(
                CommandStep::new(Stage::MutateScratch, "tar")
                    .arg("--no-wildcards")
                    .arg("--delete")
                    .arg("-f")
                    .path_arg(&plain_copy)
                    .args(files.iter().cloned()),
            );
        }
    }
    pipeline.push(
        CommandStep::new(Stage::RecompressScratch, tool)
            .arg("-f")
            .path_arg(&plain_copy),
    );
    pipeline.push(
        CommandStep::new(Stage::CommitScratch, "mv")
            .path_arg(&compressed_copy)
            .path_arg(&archive.archive_path),
    );
    Ok(pipeline)
}

/// Compiles an `extract` operation.
///
/// With directory structure (the default, or forced by the global
/// preference) a single tar invocation extracts straight into the
/// destination. Without it, extraction is staged through the scratch
/// directory (§flatten). The bare compressors decompress to a derived file
/// name in the destination.
///
/// Note: tar lists `\` as `\\` while it extracts `\`, i.e. file names
/// containing this character can't be handled entirely.
pub fn compile_extract(
    archive: &mut ArchiveDescriptor,
    files: &[String],
    listing: &Listing,
    always_full_path: bool,
) -> Result<CommandPipeline> {
    if archive.kind.is_pure_compressor() {
        return compile_decompress(archive);
    }

    if archive.do_full_path || always_full_path {
        let destination = required_extraction_path(archive)?;
        let mut pipeline = CommandPipeline::default();
        let mut step = CommandStep::new(Stage::Extract, "tar")
            .args(tar_mode_args(archive.kind, 'x'))
            .path_arg(&archive.archive_path)
            .args(overwrite_args(archive));
        if archive.do_touch {
            step = step.arg("--touch");
        }
        pipeline.push(
            step.arg("-C")
                .path_arg(&destination)
                .args(files.iter().cloned()),
        );
        return Ok(pipeline);
    }

    compile_flat_extract(archive, files, listing)
}

/// Flattened extraction: extract into scratch, then relocate each path into
/// the destination. Exists only because tar cannot flatten on its own.
///
/// An empty selection means "everything" and is resolved to the full
/// recursive set of known entry names before the extract command is built,
/// so the command handed to tar is never an accidental "extract nothing".
fn compile_flat_extract(
    archive: &mut ArchiveDescriptor,
    files: &[String],
    listing: &Listing,
) -> Result<CommandPipeline> {
    let scratch = archive
        .scratch_dir
        .clone()
        .ok_or_else(|| TarmanError::Scratch("no scratch directory for flat extraction".into()))?;
    let destination = required_extraction_path(archive)?;

    let selection: Vec<String> = if files.is_empty() {
        listing.all_names()
    } else {
        files.to_vec()
    };
    if selection.is_empty() {
        // Nothing known to extract; nothing to do.
        return Ok(CommandPipeline::default());
    }

    let mut pipeline = CommandPipeline::default();
    let mut step = CommandStep::new(Stage::Extract, "tar")
        .args(tar_mode_args(archive.kind, 'x'))
        .path_arg(&archive.archive_path)
        .args(overwrite_args(archive));
    if !cfg!(target_os = "freebsd") {
        // Selected names are matched literally, never as shell globs.
        step = step.arg("--no-wildcards");
    }
    if archive.do_touch {
        step = step.arg("--touch");
    }
    pipeline.push(step.arg("-C").path_arg(&scratch).args(selection.clone()));

    let needs_relocation =
        selection.iter().any(|name| name.contains('/')) || scratch != destination;
    if needs_relocation {
        archive.working_dir = Some(scratch.clone());
        // An entry whose parent directory is also selected moves with the
        // parent; relocating it again would find nothing at the old path.
        for name in selection
            .iter()
            .filter(|name| !covered_by_selected_parent(name, &selection))
        {
            pipeline.push(
                CommandStep::new(Stage::Relocate, "mv")
                    .arg("-f")
                    .arg(name.clone())
                    .path_arg(&destination)
                    .in_dir(scratch.clone()),
            );
        }
    }
    Ok(pipeline)
}

/// True when some other selected name is an ancestor directory of `name`.
fn covered_by_selected_parent(name: &str, selection: &[String]) -> bool {
    selection.iter().any(|other| {
        let dir = other.trim_end_matches('/');
        name.trim_end_matches('/') != dir && name.starts_with(&format!("{dir}/"))
    })
}

/// Decompression of a bare compressor stream to a derived output name.
fn compile_decompress(archive: &ArchiveDescriptor) -> Result<CommandPipeline> {
    let destination = required_extraction_path(archive)?;
    let tool = archive
        .kind
        .compressor_program()
        .expect("pure compressor kinds always have a tool");

    let output = destination.join(decompressed_file_name(&archive.source_path));
    let mut pipeline = CommandPipeline::default();
    pipeline.push(
        CommandStep::new(Stage::Decompress, tool)
            .arg("-c")
            .arg("-d")
            .path_arg(&archive.source_path)
            .stdout_to(output),
    );
    Ok(pipeline)
}

/// Output name for a decompressed stream: the source name minus its final
/// extension, or with `.out` appended when there is nothing to strip.
pub(crate) fn decompressed_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => format!("{name}.out"),
    }
}

/// Compiles a `test` (integrity check) operation. Tar-family archives are
/// listed verbosely — the output doubles as a listing and flows through the
/// parser — while the bare compressors use their own test flag.
pub fn compile_test(archive: &ArchiveDescriptor) -> CommandPipeline {
    let mut pipeline = CommandPipeline::default();
    if archive.kind.is_tar_family() {
        pipeline.push(
            CommandStep::new(Stage::Test, "tar")
                .args(tar_mode_args(archive.kind, 't'))
                .path_arg(&archive.source_path),
        );
    } else {
        let tool = archive
            .kind
            .compressor_program()
            .expect("pure compressor kinds always have a tool");
        pipeline.push(
            CommandStep::new(Stage::Test, tool)
                .arg("-t")
                .arg("-v")
                .path_arg(&archive.source_path),
        );
    }
    pipeline
}

/// Compiles a `list` operation. Only the tar family produces parseable
/// listing text; for a bare compressor the pipeline is empty and the caller
/// presents the stream as its single pseudo-entry.
pub fn compile_list(archive: &ArchiveDescriptor) -> CommandPipeline {
    let mut pipeline = CommandPipeline::default();
    if archive.kind.is_tar_family() {
        pipeline.push(
            CommandStep::new(Stage::List, "tar")
                .args(tar_mode_args(archive.kind, 't'))
                .path_arg(&archive.archive_path),
        );
    }
    pipeline
}

fn required_extraction_path(archive: &ArchiveDescriptor) -> Result<PathBuf> {
    archive
        .extraction_path
        .clone()
        .ok_or_else(|| TarmanError::Archive("no extraction path set".into()).into())
}
