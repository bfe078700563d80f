//! # Tarman Listing Parser (`common::archive::listing`)
//!
//! File: cli/src/common/archive/listing.rs
//! Author: Christi Mahu
//! Repository: https://github.com/christimahu/tarman
//!
//! ## Overview
//!
//! This module turns one line of verbose `tar` listing output into one typed
//! `Entry` and accumulates the per-archive aggregates (entry count, total
//! byte size) on the `ArchiveDescriptor`. It also maintains the in-memory
//! `Listing` tree that later operations consult — most importantly flattened
//! extraction, which must resolve an empty selection to the full recursive
//! set of known entry names.
//!
//! ## Architecture
//!
//! The listing layout is positional, not delimiter-separated: owner/group
//! names and dates can themselves contain spaces, so fields are extracted by
//! scanning from fixed anchor offsets rather than splitting on whitespace.
//! A typical GNU tar line:
//!
//! ```text
//! -rw-r--r-- user/group      1024 2023-01-01 10:00 notes.txt
//! drwxr-xr-x user/group         0 2023-01-01 10:00 dir
//! lrwxrwxrwx user/group         0 2023-01-01 10:00 link -> target
//! ```
//!
//! BSD tar spaces the columns differently, which is why the scans tolerate
//! variable-width runs of blanks between fields. Two quirks are normalized
//! here so every downstream consumer sees uniform names:
//! - GNU tar omits the trailing `/` on directory entries; it is appended.
//! - Symlink lines carry a `name -> target` construct; it is split into the
//!   entry name and the link target.
//!
//! Parsing never fails: truncated or malformed lines degrade to empty/zero
//! fields rather than aborting the listing.
//!
use crate::common::archive::ArchiveDescriptor;
use std::collections::BTreeMap;

/// Start of the owner/group field.
const OWNER_OFFSET: usize = 11;
/// Where the owner-boundary search starts; skips the minimum-width
/// link-count field so a space inside it is not taken for the boundary.
const OWNER_SCAN_OFFSET: usize = 13;

/// One parsed listing line. Only `name` outlives the presentation of the
/// listing; the remaining fields are display concerns of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 10-character mode string, e.g. `-rw-r--r--`.
    pub permissions: String,
    /// Owner and group as printed, e.g. `user/group`.
    pub owner_group: String,
    /// Entry size in bytes; 0 when the size column was malformed.
    pub size: u64,
    /// Date token as printed (layout varies between tar flavors).
    pub date: String,
    /// Time token as printed.
    pub time: String,
    /// Entry name; directories always end with exactly one `/`.
    pub name: String,
    /// Target of a symbolic link, when the line carried a `->` marker.
    pub link_target: Option<String>,
}

impl Entry {
    /// True when the permissions mark this entry as a directory.
    #[allow(dead_code)] // Presentation layers key on this; the CLI prints names as-is.
    pub fn is_directory(&self) -> bool {
        self.permissions.starts_with('d')
    }
}

/// Byte-index slice that degrades to `""` instead of panicking on
/// out-of-range or non-UTF-8-boundary indices.
fn slice(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("")
}

/// Parses one verbose-listing line into an `Entry`, updating the archive's
/// `file_count` and `total_size` aggregates.
///
/// The scan walks the line left to right: fixed-width permissions, owner
/// from a fixed anchor up to the next space, size from the first digit after
/// the owner, then the date and time tokens, then the name. All field
/// boundaries found by scanning are ASCII (spaces and digits), so the byte
/// indices are always valid char boundaries.
pub fn parse_listing_line(line: &str, archive: &mut ArchiveDescriptor) -> Entry {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    let bytes = line.as_bytes();
    let len = bytes.len();

    // Permissions: fixed-width first 10 characters.
    let permissions = slice(line, 0, 10.min(len)).to_string();

    // Owner/Group: from offset 11 up to the next space, with the boundary
    // search starting past the minimum-width link-count field.
    let mut n = OWNER_SCAN_OFFSET.min(len);
    while n < len && bytes[n] != b' ' {
        n += 1;
    }
    let owner_group = slice(line, OWNER_OFFSET.min(len), n).to_string();

    // Size: skip the variable-width gap to the first decimal digit, then
    // take digits up to the next space. Malformed content parses to 0.
    while n < len && !bytes[n].is_ascii_digit() {
        n += 1;
    }
    let size_start = n;
    while n < len && bytes[n] != b' ' {
        n += 1;
    }
    let size: u64 = slice(line, size_start, n).parse().unwrap_or(0);

    // Date, then time: the next two whitespace-delimited tokens.
    let (date, next) = next_token(line, n);
    let (time, next) = next_token(line, next);

    // Name: the remainder, past the single delimiter space.
    let name_start = if next < len { next + 1 } else { len };
    let mut name = slice(line, name_start, len).to_string();

    // Symbolic link: the first `->` occurrence splits name from target. A
    // file name genuinely containing `->` is misparsed; known limitation.
    let link_target = match name.find("->") {
        Some(pos) => {
            let target = name[pos + 2..].trim().to_string();
            name = name[..pos].trim_end().to_string();
            Some(target)
        }
        None => None,
    };

    // GNU tar omits the trailing slash on directories; BSD tar prints it.
    // Normalize so listings compare and display uniformly.
    if permissions.starts_with('d') && !name.ends_with('/') {
        name.push('/');
    }

    archive.file_count += 1;
    archive.total_size += size;

    Entry {
        permissions,
        owner_group,
        size,
        date,
        time,
        name,
        link_target,
    }
}

/// Skips the whitespace run starting at `from`, then returns the next
/// space-terminated token and the index just past it.
fn next_token(line: &str, from: usize) -> (String, usize) {
    let bytes = line.as_bytes();
    let len = bytes.len();
    let mut start = from.min(len);
    while start < len && bytes[start] == b' ' {
        start += 1;
    }
    let mut end = start;
    while end < len && bytes[end] != b' ' {
        end += 1;
    }
    (slice(line, start, end).to_string(), end)
}

/// The in-memory listing of one archive session: the parsed entries plus a
/// name tree for recursive enumeration.
///
/// Tar listings are flat (every line carries the full path), but selection
/// resolution works from root entries downward, so the names are kept as a
/// tree keyed by path component.
#[derive(Debug, Default)]
pub struct Listing {
    entries: Vec<Entry>,
    roots: BTreeMap<String, ListingNode>,
}

#[derive(Debug, Default)]
struct ListingNode {
    /// Full entry name as listed, present when this node was itself listed
    /// (a directory can appear only implicitly, via its children).
    listed_name: Option<String>,
    children: BTreeMap<String, ListingNode>,
}

impl Listing {
    /// Records one parsed entry in the flat list and the name tree.
    pub fn push(&mut self, entry: Entry) {
        let full = entry.name.clone();
        let components: Vec<String> = full
            .split('/')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if let Some((leaf_key, parents)) = components.split_last() {
            let mut node = &mut self.roots;
            for component in parents {
                node = &mut node.entry(component.clone()).or_default().children;
            }
            node.entry(leaf_key.clone()).or_default().listed_name = Some(full);
        }
        self.entries.push(entry);
    }

    /// All parsed entries, in listing order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolves "nothing selected" to "everything": the full recursive set
    /// of known entry names, walking from the root entries through all
    /// directory contents.
    pub fn all_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.entries.len());
        collect_names(&self.roots, &mut names);
        names
    }
}

fn collect_names(nodes: &BTreeMap<String, ListingNode>, out: &mut Vec<String>) {
    for node in nodes.values() {
        if let Some(name) = &node.listed_name {
            out.push(name.clone());
        }
        collect_names(&node.children, out);
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::archive::{ArchiveDescriptor, ArchiveKind};
    use std::path::Path;

    fn descriptor() -> ArchiveDescriptor {
        ArchiveDescriptor::new(ArchiveKind::Tar, Path::new("fixture.tar"))
    }

    #[test]
    fn test_parse_regular_file_line() {
        let mut archive = descriptor();
        let entry = parse_listing_line(
            "-rw-r--r-- user/group      1024 2023-01-01 10:00 notes.txt\n",
            &mut archive,
        );
        assert_eq!(entry.permissions, "-rw-r--r--");
        assert_eq!(entry.owner_group, "user/group");
        assert_eq!(entry.size, 1024);
        assert_eq!(entry.date, "2023-01-01");
        assert_eq!(entry.time, "10:00");
        assert_eq!(entry.name, "notes.txt");
        assert_eq!(entry.link_target, None);
        assert_eq!(archive.file_count, 1);
        assert_eq!(archive.total_size, 1024);
    }

    #[test]
    fn test_directory_gets_exactly_one_trailing_slash() {
        let mut archive = descriptor();
        // GNU tar: no trailing slash on the raw line.
        let gnu = parse_listing_line(
            "drwxr-xr-x user/group         0 2023-01-01 10:00 src\n",
            &mut archive,
        );
        assert_eq!(gnu.name, "src/");
        assert!(gnu.is_directory());

        // BSD tar: trailing slash already present; must not double it.
        let bsd = parse_listing_line(
            "drwxr-xr-x user/group         0 2023-01-01 10:00 src/\n",
            &mut archive,
        );
        assert_eq!(bsd.name, "src/");
    }

    #[test]
    fn test_symlink_split_and_trim() {
        let mut archive = descriptor();
        let entry = parse_listing_line(
            "lrwxrwxrwx user/group         0 2023-01-01 10:00 current -> releases/v2\n",
            &mut archive,
        );
        assert_eq!(entry.name, "current");
        assert_eq!(entry.link_target.as_deref(), Some("releases/v2"));
    }

    #[test]
    fn test_arrow_in_file_name_is_misparsed_not_crashed() {
        // Documented limitation: the first `->` is taken as the marker.
        let mut archive = descriptor();
        let entry = parse_listing_line(
            "-rw-r--r-- user/group        12 2023-01-01 10:00 a->b.txt\n",
            &mut archive,
        );
        assert_eq!(entry.name, "a");
        assert_eq!(entry.link_target.as_deref(), Some("b.txt"));
    }

    #[test]
    fn test_size_accumulation_over_sequence() {
        let mut archive = descriptor();
        let sizes = [10u64, 200, 3000];
        for (i, size) in sizes.iter().enumerate() {
            let line = format!(
                "-rw-r--r-- user/group {:>9} 2023-01-01 10:00 file{}.txt\n",
                size, i
            );
            parse_listing_line(&line, &mut archive);
        }
        assert_eq!(archive.file_count, 3);
        assert_eq!(archive.total_size, 3210);
    }

    #[test]
    fn test_malformed_size_degrades_to_zero() {
        let mut archive = descriptor();
        let entry = parse_listing_line(
            "-rw-r--r-- user/group ???? 2023-01-01 10:00 odd.bin\n",
            &mut archive,
        );
        assert_eq!(entry.size, 0);
        assert_eq!(archive.file_count, 1);
        assert_eq!(archive.total_size, 0);
    }

    #[test]
    fn test_truncated_line_never_panics() {
        let mut archive = descriptor();
        for line in ["", "-rw", "-rw-r--r-- us", "-rw-r--r-- user/group"] {
            let entry = parse_listing_line(line, &mut archive);
            assert_eq!(entry.size, 0);
            assert_eq!(entry.link_target, None);
        }
        assert_eq!(archive.file_count, 4);
        assert_eq!(archive.total_size, 0);
    }

    #[test]
    fn test_owner_group_with_numeric_ids() {
        let mut archive = descriptor();
        let entry = parse_listing_line(
            "-rw-r--r-- 1000/1000      512 2023-06-15 09:30 data.csv\n",
            &mut archive,
        );
        assert_eq!(entry.owner_group, "1000/1000");
        assert_eq!(entry.size, 512);
        assert_eq!(entry.name, "data.csv");
    }

    #[test]
    fn test_wide_columns_and_nested_name() {
        let mut archive = descriptor();
        let entry = parse_listing_line(
            "-rwxr-xr-x root/root     123456 2023-12-31 23:59 usr/local/bin/tool\n",
            &mut archive,
        );
        assert_eq!(entry.permissions, "-rwxr-xr-x");
        assert_eq!(entry.owner_group, "root/root");
        assert_eq!(entry.size, 123456);
        assert_eq!(entry.date, "2023-12-31");
        assert_eq!(entry.time, "23:59");
        assert_eq!(entry.name, "usr/local/bin/tool");
    }

    #[test]
    fn test_listing_tree_resolves_all_names() {
        let mut archive = descriptor();
        let mut listing = Listing::default();
        for line in [
            "-rw-r--r-- user/group        10 2023-01-01 10:00 a\n",
            "drwxr-xr-x user/group         0 2023-01-01 10:00 dir\n",
            "-rw-r--r-- user/group        20 2023-01-01 10:00 dir/b\n",
        ] {
            let entry = parse_listing_line(line, &mut archive);
            listing.push(entry);
        }
        let names = listing.all_names();
        assert!(names.contains(&"a".to_string()));
        assert!(names.contains(&"dir/".to_string()));
        assert!(names.contains(&"dir/b".to_string()));
        assert_eq!(listing.len(), 3);
    }

    #[test]
    fn test_listing_tree_child_without_listed_parent() {
        // A member can be listed without its parent directory appearing.
        let mut archive = descriptor();
        let mut listing = Listing::default();
        for line in [
            "-rw-r--r-- user/group        10 2023-01-01 10:00 a\n",
            "-rw-r--r-- user/group        20 2023-01-01 10:00 dir/b\n",
        ] {
            let entry = parse_listing_line(line, &mut archive);
            listing.push(entry);
        }
        let names = listing.all_names();
        assert_eq!(names, vec!["a".to_string(), "dir/b".to_string()]);
    }
}
