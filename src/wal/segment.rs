//! Segment files
//!
//! A segment is a file named `<N>` or `<N>.seg` holding newline-terminated
//! query lines. Indices are contiguous from 0 and only the highest-indexed
//! segment (the active one) is ever appended to.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub(crate) const SEGMENT_EXTENSION: &str = "seg";

/// The active segment: an open append handle plus its tracked attributes
#[derive(Debug)]
pub struct Segment {
    /// Integer index parsed from the file name
    pub index: u64,

    /// Append handle; the writer owns it exclusively
    pub file: File,

    /// Current byte size
    pub size: u64,

    /// Current line count
    pub lines: u64,
}

/// On-disk framed length of a record: the line plus its newline terminator
pub fn framed_len(line: &str) -> u64 {
    line.len() as u64 + 1
}

/// Open the highest-indexed segment for appending, creating segment 0 when
/// the directory is empty. Records the file's byte size and line count.
pub fn open_active(dir: &Path) -> Result<Segment> {
    fs::create_dir_all(dir)?;

    let (index, path) = sorted_segment_paths(dir)?
        .into_iter()
        .last()
        .unwrap_or_else(|| (0, segment_path(dir, 0)));

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let size = file.metadata()?.len();
    let lines = count_lines(&path)?;

    Ok(Segment {
        index,
        file,
        size,
        lines,
    })
}

/// Create the segment file for `index`; fails if it already exists.
pub(crate) fn create_segment(dir: &Path, index: u64) -> Result<Segment> {
    let path = segment_path(dir, index);
    let file = OpenOptions::new()
        .create_new(true)
        .append(true)
        .open(&path)?;

    Ok(Segment {
        index,
        file,
        size: 0,
        lines: 0,
    })
}

/// Path of the segment file written for `index`
pub(crate) fn segment_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{index}.{SEGMENT_EXTENSION}"))
}

/// All segment files in the directory, sorted by numeric index.
///
/// Only the integer prefix of the file name matters; a `.seg` suffix is
/// accepted and anything that does not parse to an index is skipped.
pub(crate) fn sorted_segment_paths(dir: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(index) = segment_index(&path) {
            segments.push((index, path));
        }
    }
    segments.sort_by_key(|(index, _)| *index);
    Ok(segments)
}

/// Parse the integer index out of a segment file name
pub(crate) fn segment_index(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.parse().ok()
}

fn count_lines(path: &Path) -> Result<u64> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0;
    for line in reader.lines() {
        line?;
        lines += 1;
    }
    Ok(lines)
}
