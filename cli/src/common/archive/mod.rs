//! # Tarman Archive Model (`common::archive`)
//!
//! File: cli/src/common/archive/mod.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module is the root of the archive subsystem. It defines the archive
//! kind taxonomy (plain tar, the five compressed-tar combinations, and the
//! five bare single-file compressors), the per-kind capability table, and the
//! `ArchiveDescriptor` that carries one archive session's paths, flags, and
//! listing aggregates through the parser and the pipeline compiler.
//!
//! ## Architecture
//!
//! The archive subsystem is split into three submodules:
//!
//! - **`detect`**: Magic-number sniffing at archive-open time (tar header at
//!   offset 257, compressor signatures at offset 0) plus file-name based
//!   classification for archives that do not exist yet.
//! - **`listing`**: The verbose-listing parser — one line of `tar -tvf`
//!   output becomes one typed `Entry` — and the in-memory `Listing` tree used
//!   to resolve an empty selection to "everything".
//! - **`pipeline`**: The operation-to-pipeline compiler — {operation, kind,
//!   flags, selection} becomes an ordered list of structured external-tool
//!   invocations, including the scratch-directory staging that compressed-tar
//!   mutation and flattened extraction require.
//!
//! ## Usage
//!
//! ```rust
//! use crate::common::archive::{self, ArchiveDescriptor, ArchiveKind};
//!
//! let kind = archive::detect::detect_kind(Path::new("backup.tar.gz"))?;
//! assert!(kind.is_compressed_tar());
//! let mut descriptor = ArchiveDescriptor::new(kind, Path::new("backup.tar.gz"));
//! let pipeline = archive::pipeline::compile_test(&descriptor);
//! ```
//!
use std::fmt;
use std::path::{Path, PathBuf};

/// Magic-number detection for archive-open time.
pub mod detect;
/// Verbose-listing parser and the in-memory entry tree.
pub mod listing;
/// Operation-to-pipeline compiler.
pub mod pipeline;

/// The archive kinds Tarman drives. A kind is fixed for the lifetime of one
/// archive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Plain uncompressed tar container. Supports in-place mutation.
    Tar,
    /// Tar container compressed as a whole with bzip2 (`.tar.bz2`).
    TarBzip2,
    /// Tar container compressed as a whole with gzip (`.tar.gz`).
    TarGzip,
    /// Tar container compressed as a whole with lzma (`.tar.lzma`).
    TarLzma,
    /// Tar container compressed as a whole with xz (`.tar.xz`).
    TarXz,
    /// Tar container compressed as a whole with lzop (`.tar.lzo`).
    TarLzop,
    /// Bare bzip2 single-file stream, no tar container.
    Bzip2,
    /// Bare gzip single-file stream, no tar container.
    Gzip,
    /// Bare lzma single-file stream, no tar container.
    Lzma,
    /// Bare xz single-file stream, no tar container.
    Xz,
    /// Bare lzop single-file stream, no tar container.
    Lzop,
}

impl ArchiveKind {
    /// True exactly for the five tar-plus-compressor combinations. These
    /// kinds cannot be mutated through the compression layer and need the
    /// scratch staging procedure for add/delete.
    pub fn is_compressed_tar(self) -> bool {
        matches!(
            self,
            ArchiveKind::TarBzip2
                | ArchiveKind::TarGzip
                | ArchiveKind::TarLzma
                | ArchiveKind::TarXz
                | ArchiveKind::TarLzop
        )
    }

    /// True exactly for the five bare single-file compressor kinds. These
    /// support whole-file compress/decompress only, never entry-level
    /// add/delete.
    pub fn is_pure_compressor(self) -> bool {
        matches!(
            self,
            ArchiveKind::Bzip2
                | ArchiveKind::Gzip
                | ArchiveKind::Lzma
                | ArchiveKind::Xz
                | ArchiveKind::Lzop
        )
    }

    /// Any kind backed by a tar container, compressed or not.
    pub fn is_tar_family(self) -> bool {
        self == ArchiveKind::Tar || self.is_compressed_tar()
    }

    /// The external compressor tool for this kind, if it has one.
    pub fn compressor_program(self) -> Option<&'static str> {
        match self {
            ArchiveKind::TarBzip2 | ArchiveKind::Bzip2 => Some("bzip2"),
            ArchiveKind::TarGzip | ArchiveKind::Gzip => Some("gzip"),
            ArchiveKind::TarLzma | ArchiveKind::Lzma => Some("lzma"),
            ArchiveKind::TarXz | ArchiveKind::Xz => Some("xz"),
            ArchiveKind::TarLzop | ArchiveKind::Lzop => Some("lzop"),
            ArchiveKind::Tar => None,
        }
    }

    /// Canonical extension the compressor appends/strips (`bz2`, `gz`,
    /// `lzma`, `xz`, `lzo`). Used for the scratch file name during staging.
    pub fn scratch_extension(self) -> Option<&'static str> {
        match self {
            ArchiveKind::TarBzip2 | ArchiveKind::Bzip2 => Some("bz2"),
            ArchiveKind::TarGzip | ArchiveKind::Gzip => Some("gz"),
            ArchiveKind::TarLzma | ArchiveKind::Lzma => Some("lzma"),
            ArchiveKind::TarXz | ArchiveKind::Xz => Some("xz"),
            ArchiveKind::TarLzop | ArchiveKind::Lzop => Some("lzo"),
            ArchiveKind::Tar => None,
        }
    }

    /// What operations and flags this kind supports.
    pub fn capabilities(self) -> Capabilities {
        if self.is_tar_family() {
            Capabilities {
                can_add: true,
                can_delete: true,
                can_extract: true,
                can_test: true,
                can_touch: true,
                can_move: true,
                can_overwrite: true,
                can_full_path: true,
                can_update: true,
                can_recurse: true,
            }
        } else {
            // Bare compressors: whole-file recompress/decompress/test only.
            Capabilities {
                can_add: true,
                can_delete: false,
                can_extract: true,
                can_test: true,
                can_touch: false,
                can_move: false,
                can_overwrite: false,
                can_full_path: false,
                can_update: false,
                can_recurse: false,
            }
        }
    }

    /// Classifies an archive by file name alone. This is the fallback for
    /// `add` targets that do not exist yet, where there is no file to sniff.
    pub fn from_file_name(path: &Path) -> Option<ArchiveKind> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz") {
            Some(ArchiveKind::TarBzip2)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGzip)
        } else if name.ends_with(".tar.lzma") || name.ends_with(".tlz") {
            Some(ArchiveKind::TarLzma)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(ArchiveKind::TarXz)
        } else if name.ends_with(".tar.lzo") || name.ends_with(".tzo") {
            Some(ArchiveKind::TarLzop)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".bz2") {
            Some(ArchiveKind::Bzip2)
        } else if name.ends_with(".gz") {
            Some(ArchiveKind::Gzip)
        } else if name.ends_with(".lzma") {
            Some(ArchiveKind::Lzma)
        } else if name.ends_with(".xz") {
            Some(ArchiveKind::Xz)
        } else if name.ends_with(".lzo") {
            Some(ArchiveKind::Lzop)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArchiveKind::Tar => "tar",
            ArchiveKind::TarBzip2 => "tar.bz2",
            ArchiveKind::TarGzip => "tar.gz",
            ArchiveKind::TarLzma => "tar.lzma",
            ArchiveKind::TarXz => "tar.xz",
            ArchiveKind::TarLzop => "tar.lzo",
            ArchiveKind::Bzip2 => "bzip2",
            ArchiveKind::Gzip => "gzip",
            ArchiveKind::Lzma => "lzma",
            ArchiveKind::Xz => "xz",
            ArchiveKind::Lzop => "lzop",
        };
        f.write_str(label)
    }
}

/// Per-kind operation/flag support table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_add: bool,
    pub can_delete: bool,
    pub can_extract: bool,
    pub can_test: bool,
    pub can_touch: bool,
    pub can_move: bool,
    pub can_overwrite: bool,
    pub can_full_path: bool,
    pub can_update: bool,
    pub can_recurse: bool,
}

/// One archive session: paths, scratch state, per-invocation flags, and the
/// aggregates the listing parser accumulates.
///
/// `source_path` and `archive_path` point at the same file except while a
/// staged operation is in flight; read-only operations (test) go through
/// `source_path`, mutating operations and listing through `archive_path`.
#[derive(Debug, Clone)]
pub struct ArchiveDescriptor {
    /// Immutable for the lifetime of the session.
    pub kind: ArchiveKind,
    /// Original source path, used for read-only operations.
    pub source_path: PathBuf,
    /// Working archive path, used for mutating operations.
    pub archive_path: PathBuf,
    /// Working directory child processes run from; set to the scratch
    /// directory while a staged operation is in flight, `None` otherwise.
    pub working_dir: Option<PathBuf>,
    /// Session-private staging area. Must be set before any staged pipeline
    /// is compiled; created (and cleaned up) by the command layer.
    pub scratch_dir: Option<PathBuf>,
    /// Final destination for extraction.
    pub extraction_path: Option<PathBuf>,

    /// Let tar recurse into directories when adding (on by default).
    pub do_recurse: bool,
    /// Delete source files after a successful add (`--remove-files`).
    pub do_move: bool,
    /// Update rather than append on add (`-u` vs `-r`).
    pub do_update: bool,
    /// Overwrite existing files on extract (else keep old files).
    pub do_overwrite: bool,
    /// Restore the archived timestamps on extract (`--touch`).
    pub do_touch: bool,
    /// Preserve directory structure on extract.
    pub do_full_path: bool,

    /// Number of entries parsed so far; incremented only by the parser.
    pub file_count: u64,
    /// Running sum of parsed entry sizes in bytes; parser-owned.
    pub total_size: u64,
}

impl ArchiveDescriptor {
    /// Creates a descriptor with both path slots pointing at `path` and all
    /// flags at their defaults (recursion on, everything else off).
    pub fn new(kind: ArchiveKind, path: &Path) -> Self {
        ArchiveDescriptor {
            kind,
            source_path: path.to_path_buf(),
            archive_path: path.to_path_buf(),
            working_dir: None,
            scratch_dir: None,
            extraction_path: None,
            do_recurse: true,
            do_move: false,
            do_update: false,
            do_overwrite: false,
            do_touch: false,
            do_full_path: true,
            file_count: 0,
            total_size: 0,
        }
    }

    /// Clears the staged-operation working directory. Called when a pipeline
    /// finishes, successfully or not.
    pub fn reset_working_dir(&mut self) {
        self.working_dir = None;
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compressed_tar_predicate_exact_set() {
        let compressed = [
            ArchiveKind::TarBzip2,
            ArchiveKind::TarGzip,
            ArchiveKind::TarLzma,
            ArchiveKind::TarXz,
            ArchiveKind::TarLzop,
        ];
        for kind in compressed {
            assert!(kind.is_compressed_tar(), "{kind} should be compressed tar");
            // Pure function: stable across repeated calls.
            assert!(kind.is_compressed_tar());
        }
        let not_compressed = [
            ArchiveKind::Tar,
            ArchiveKind::Bzip2,
            ArchiveKind::Gzip,
            ArchiveKind::Lzma,
            ArchiveKind::Xz,
            ArchiveKind::Lzop,
        ];
        for kind in not_compressed {
            assert!(!kind.is_compressed_tar(), "{kind} is not a compressed tar");
        }
    }

    #[test]
    fn test_pure_compressors_cannot_delete() {
        for kind in [
            ArchiveKind::Bzip2,
            ArchiveKind::Gzip,
            ArchiveKind::Lzma,
            ArchiveKind::Xz,
            ArchiveKind::Lzop,
        ] {
            let caps = kind.capabilities();
            assert!(!caps.can_delete);
            assert!(caps.can_add, "add means whole-file recompress for {kind}");
            assert!(caps.can_extract);
        }
        assert!(ArchiveKind::TarGzip.capabilities().can_delete);
    }

    #[test]
    fn test_kind_from_file_name() {
        let cases = [
            ("backup.tar", ArchiveKind::Tar),
            ("backup.tar.gz", ArchiveKind::TarGzip),
            ("backup.TGZ", ArchiveKind::TarGzip),
            ("backup.tar.bz2", ArchiveKind::TarBzip2),
            ("backup.tar.lzma", ArchiveKind::TarLzma),
            ("backup.tar.xz", ArchiveKind::TarXz),
            ("backup.txz", ArchiveKind::TarXz),
            ("backup.tar.lzo", ArchiveKind::TarLzop),
            ("notes.txt.bz2", ArchiveKind::Bzip2),
            ("notes.txt.gz", ArchiveKind::Gzip),
            ("notes.txt.lzma", ArchiveKind::Lzma),
            ("notes.txt.xz", ArchiveKind::Xz),
            ("notes.txt.lzo", ArchiveKind::Lzop),
        ];
        for (name, expected) in cases {
            assert_eq!(
                ArchiveKind::from_file_name(Path::new(name)),
                Some(expected),
                "classifying {name}"
            );
        }
        assert_eq!(ArchiveKind::from_file_name(Path::new("notes.txt")), None);
    }

    #[test]
    fn test_scratch_extension_matches_compressor() {
        assert_eq!(ArchiveKind::TarBzip2.scratch_extension(), Some("bz2"));
        assert_eq!(ArchiveKind::TarGzip.scratch_extension(), Some("gz"));
        assert_eq!(ArchiveKind::TarLzop.scratch_extension(), Some("lzo"));
        assert_eq!(ArchiveKind::Tar.scratch_extension(), None);
        assert_eq!(ArchiveKind::Tar.compressor_program(), None);
        assert_eq!(ArchiveKind::TarXz.compressor_program(), Some("xz"));
    }

    #[test]
    fn test_descriptor_defaults() {
        let descriptor = ArchiveDescriptor::new(ArchiveKind::Tar, Path::new("a.tar"));
        assert_eq!(descriptor.source_path, descriptor.archive_path);
        assert!(descriptor.do_recurse);
        assert!(!descriptor.do_update);
        assert_eq!(descriptor.file_count, 0);
        assert_eq!(descriptor.total_size, 0);
    }
}
