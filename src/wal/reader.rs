//! Segment reader
//!
//! Read-side of the log: recovery replay and the random-access read that
//! feeds replication. The reader opens its own file handles per call and
//! never touches the writer's descriptor, so it can run alongside appends;
//! it observes whatever was durably flushed at some moment during the call.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::Result;

use super::segment::sorted_segment_paths;
use super::LogPosition;

/// Reads segment files in ascending index order
pub struct SegmentReader {
    dir: PathBuf,
}

impl SegmentReader {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Visit every record of every segment, segments in index order and
    /// lines in file order. An error returned by the callback stops the
    /// iteration and propagates.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<()>,
    {
        for (_, path) in sorted_segment_paths(&self.dir)? {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                f(&line?)?;
            }
        }
        Ok(())
    }

    /// All records strictly after `position`: segments at a lower index are
    /// skipped entirely, and the first `position.line_number` lines of the
    /// starting segment are skipped.
    pub fn read_from(&self, position: LogPosition) -> Result<Vec<String>> {
        let mut records = Vec::new();
        for (index, path) in sorted_segment_paths(&self.dir)? {
            if index < position.segment_index {
                continue;
            }
            let skip = if index == position.segment_index {
                position.line_number as usize
            } else {
                0
            };

            let reader = BufReader::new(File::open(&path)?);
            for (line_number, line) in reader.lines().enumerate() {
                let line = line?;
                if line_number >= skip {
                    records.push(line);
                }
            }
        }
        Ok(records)
    }
}
