//! # Tarman Archive Detection (`common::archive::detect`)
//!
//! File: cli/src/common/archive/detect.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! Magic-number classification performed at archive-open time. A tar
//! container is recognized by the 7 bytes at offset 257 of the file: either
//! the POSIX ustar magic (`"ustar\0"` followed by `'0'`), the old GNU magic
//! (`"ustar"` followed by two spaces), or seven zero bytes (old-format tar
//! with no magic at all). Compressor streams are recognized by their
//! signatures at offset 0.
//!
//! ## Architecture
//!
//! Detection runs in two steps:
//! 1. `is_tar_stream` checks the tar magic. The read position is restored to
//!    the start of the stream afterward regardless of outcome, so the caller
//!    can hand the same handle to whatever reads the file next.
//! 2. If the file is not a bare tar, the first bytes are sniffed for a
//!    compressor signature. A compressor hit is then refined by file name:
//!    `backup.tar.gz` is a compressed tar, `notes.txt.gz` a bare gzip
//!    stream. The compression layer hides the tar magic, so the name is the
//!    only signal available without decompressing.
//!
use crate::common::archive::ArchiveKind;
use crate::core::error::{Result, TarmanError};
use anyhow::Context;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Offset of the magic field in a ustar header block.
const TAR_MAGIC_OFFSET: u64 = 257;
/// Length of the magic field we compare.
const TAR_MAGIC_LEN: usize = 7;

/// Returns true when the stream carries a tar container: 7 bytes at offset
/// 257 equal to `"ustar\0" + '0'`, `"ustar  "` (two trailing spaces), or
/// seven zero bytes. Streams shorter than offset + magic are not tar.
///
/// The read position is restored to the start of the stream in every
/// outcome, including errors.
pub fn is_tar_stream<R: Read + Seek>(reader: &mut R) -> std::io::Result<bool> {
    let mut magic = [0u8; TAR_MAGIC_LEN];

    reader.seek(SeekFrom::Start(TAR_MAGIC_OFFSET))?;
    let read = read_fully(reader, &mut magic);
    reader.seek(SeekFrom::Start(0))?;

    if read? < TAR_MAGIC_LEN {
        return Ok(false);
    }

    Ok(&magic == b"ustar\x000" || &magic == b"ustar  " || magic == [0u8; TAR_MAGIC_LEN])
}

/// Reads until the buffer is full or EOF; returns the number of bytes read.
/// Plain `read` may legally return short counts, which must not be confused
/// with a short file.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Compressor stream signatures at offset 0. lzma's header is only a weakly
/// specified properties byte plus dictionary size, so it is checked last.
fn sniff_compressor(prefix: &[u8]) -> Option<ArchiveKind> {
    if prefix.starts_with(&[0x1f, 0x8b]) {
        Some(ArchiveKind::Gzip)
    } else if prefix.starts_with(b"BZh") {
        Some(ArchiveKind::Bzip2)
    } else if prefix.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
        Some(ArchiveKind::Xz)
    } else if prefix.starts_with(&[0x89, 0x4c, 0x5a, 0x4f]) {
        Some(ArchiveKind::Lzop)
    } else if prefix.starts_with(&[0x5d, 0x00, 0x00]) {
        Some(ArchiveKind::Lzma)
    } else {
        None
    }
}

/// Lifts a bare-compressor kind to its tar-compressed counterpart.
fn compressed_tar_kind(bare: ArchiveKind) -> ArchiveKind {
    match bare {
        ArchiveKind::Bzip2 => ArchiveKind::TarBzip2,
        ArchiveKind::Gzip => ArchiveKind::TarGzip,
        ArchiveKind::Lzma => ArchiveKind::TarLzma,
        ArchiveKind::Xz => ArchiveKind::TarXz,
        ArchiveKind::Lzop => ArchiveKind::TarLzop,
        other => other,
    }
}

/// True when the file name says the compressed stream wraps a tar container
/// (`.tar.<ext>` or one of the `tgz`-style shorthands).
fn name_says_tar(path: &Path) -> bool {
    matches!(
        ArchiveKind::from_file_name(path),
        Some(kind) if kind.is_tar_family()
    )
}

/// Classifies an existing archive file by content, refined by name.
///
/// Tar magic wins outright. A compressor signature yields the compressed-tar
/// kind when the name carries a tar marker, the bare kind otherwise. A file
/// that matches neither is not an archive Tarman can drive.
pub fn detect_kind(path: &Path) -> Result<ArchiveKind> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open archive: {}", path.display()))?;

    if is_tar_stream(&mut file)
        .with_context(|| format!("Failed to read tar magic from {}", path.display()))?
    {
        return Ok(ArchiveKind::Tar);
    }

    let mut prefix = [0u8; 6];
    let n = read_fully(&mut file, &mut prefix)
        .with_context(|| format!("Failed to read file header from {}", path.display()))?;

    match sniff_compressor(&prefix[..n]) {
        Some(bare) if name_says_tar(path) => Ok(compressed_tar_kind(bare)),
        Some(bare) => Ok(bare),
        None => Err(TarmanError::Archive(format!(
            "Unrecognized archive format: {}",
            path.display()
        ))
        .into()),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    /// Builds a real single-entry tar in memory with the `tar` crate.
    fn tar_bytes() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let data = b"hello";
        let mut header = tar::Header::new_ustar();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "notes.txt", &data[..])
            .expect("append");
        builder.into_inner().expect("finish tar")
    }

    #[test]
    fn test_real_tar_detected_and_cursor_restored() {
        let mut cursor = Cursor::new(tar_bytes());
        assert!(is_tar_stream(&mut cursor).expect("sniff"));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_ustar_magic_variants() {
        for magic in [&b"ustar\x000"[..], &b"ustar  "[..], &[0u8; 7][..]] {
            let mut data = vec![b'x'; 257];
            data.extend_from_slice(magic);
            data.extend_from_slice(&[b'y'; 32]);
            let mut cursor = Cursor::new(data);
            assert!(is_tar_stream(&mut cursor).expect("sniff"), "{magic:?}");
            assert_eq!(cursor.position(), 0);
        }
    }

    #[test]
    fn test_short_file_is_not_tar_and_cursor_restored() {
        let mut cursor = Cursor::new(vec![0u8; 100]);
        assert!(!is_tar_stream(&mut cursor).expect("sniff"));
        assert_eq!(cursor.position(), 0);

        // Exactly at the boundary: 257 + 6 bytes is still one byte short.
        let mut cursor = Cursor::new(vec![0u8; 263]);
        assert!(!is_tar_stream(&mut cursor).expect("sniff"));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_wrong_magic_is_not_tar() {
        let mut data = vec![0x41u8; 257];
        data.extend_from_slice(b"notmagi");
        data.extend_from_slice(&[0u8; 16]);
        let mut cursor = Cursor::new(data);
        assert!(!is_tar_stream(&mut cursor).expect("sniff"));
    }

    #[test]
    fn test_detect_kind_plain_tar() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("fixture.tar");
        std::fs::write(&path, tar_bytes())?;
        assert_eq!(detect_kind(&path)?, ArchiveKind::Tar);
        Ok(())
    }

    #[test]
    fn test_detect_kind_gzip_vs_tar_gz() -> Result<()> {
        let dir = tempdir()?;

        // Same gzip bytes, classified differently by name.
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"payload")?;
        let gz = encoder.finish()?;

        let bare = dir.path().join("notes.txt.gz");
        std::fs::write(&bare, &gz)?;
        assert_eq!(detect_kind(&bare)?, ArchiveKind::Gzip);

        let wrapped = dir.path().join("backup.tar.gz");
        std::fs::write(&wrapped, &gz)?;
        assert_eq!(detect_kind(&wrapped)?, ArchiveKind::TarGzip);

        let short = dir.path().join("backup.tgz");
        std::fs::write(&short, &gz)?;
        assert_eq!(detect_kind(&short)?, ArchiveKind::TarGzip);
        Ok(())
    }

    #[test]
    fn test_detect_kind_other_signatures() -> Result<()> {
        let dir = tempdir()?;
        let cases: [(&str, &[u8], ArchiveKind); 4] = [
            ("a.bz2", b"BZh91AY", ArchiveKind::Bzip2),
            (
                "a.tar.xz",
                &[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00],
                ArchiveKind::TarXz,
            ),
            (
                "a.lzo",
                &[0x89, 0x4c, 0x5a, 0x4f, 0x00, 0x0d, 0x0a],
                ArchiveKind::Lzop,
            ),
            (
                "a.tar.lzma",
                &[0x5d, 0x00, 0x00, 0x80, 0x00, 0xff, 0xff],
                ArchiveKind::TarLzma,
            ),
        ];
        for (name, bytes, expected) in cases {
            let path = dir.path().join(name);
            std::fs::write(&path, bytes)?;
            assert_eq!(detect_kind(&path)?, expected, "classifying {name}");
        }
        Ok(())
    }

    #[test]
    fn test_detect_kind_unrecognized() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"just text, long enough to not be tar")?;
        assert!(detect_kind(&path).is_err());
        Ok(())
    }
}
